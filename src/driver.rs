// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The driver: the callback surface the character-device transport dispatches
// into, one socket slot per open handle.
//
// Every callback runs to completion against the socket table — there is no
// preemption and no lock. An operation that cannot complete records itself
// in the slot and returns the suspend marker; the transport withholds the
// reply and the driver goes back to its dispatch loop. A later request that
// changes the relevant state revives the parked one.

use log::{trace, warn};

use crate::control::{Control, ControlKind, ControlPlane};
use crate::slot::{Minor, Pending, SuspendKind, Suspension};
use crate::table::SocketTable;
use crate::transport::{Endpoint, Grant, IoFlags, Reply, RequestId, SelectOps, Transport};
use crate::wake;
use crate::xfer::{perform_read, perform_write};
use crate::SockErr;

/// The socket driver, multiplexing a table of sockets behind one
/// pseudo-device.
///
/// `T` is the character-device transport, `C` the socket-control layer.
pub struct Driver<T: Transport, C: ControlPlane<T>> {
    table: SocketTable,
    transport: T,
    control: C,
    /// Sockets left to close before a draining driver may exit; zero while
    /// not draining.
    exit_left: usize,
}

impl<T: Transport, C: ControlPlane<T>> Driver<T, C> {
    /// A fresh driver: every slot free, not draining.
    pub fn new(transport: T, control: C) -> Self {
        Self { table: SocketTable::new(), transport, control, exit_left: 0 }
    }

    /// Open the root device: allocate the smallest free slot with a fresh
    /// ring buffer and open defaults.
    ///
    /// The transport tags the returned minor as a clone, so the caller's
    /// descriptor migrates from the root device to the new socket.
    pub fn open(&mut self, user_endpt: Endpoint) -> Result<Minor, SockErr> {
        trace!("open() from endpoint {}", user_endpt.0);
        self.table.allocate(user_endpt)
    }

    /// Close a socket: tear down its linkage, release parked descriptors,
    /// free the slot and its buffer.
    pub fn close(&mut self, minor: Minor) -> Result<(), SockErr> {
        trace!("close({minor})");

        self.table.guard(minor)?;

        match self.table.peer(minor) {
            Some(p) if self.table.peer(p).is_none() => {
                // Connecting socket, still queued on a listener.
                if !self.table.is_listening(p) {
                    panic!("connecting socket attached to a non-listening socket");
                }
                self.table.remove_connecting(p, minor);
            }
            Some(p) => {
                // Connected: the peer learns about it through the sticky
                // reset.
                wake::reset(&mut self.table, &mut self.transport, p);
            }
            None if self.table.is_listening(minor) => {
                // Listener: every queued connecting socket is torn down.
                while let Some(client) = self.table.dequeue_connecting(minor) {
                    wake::reset(&mut self.table, &mut self.transport, client);
                }
            }
            None => {}
        }

        let fds = std::mem::take(&mut self.table.ancillary_mut(minor).fds);
        if !fds.is_empty() {
            self.control.release_fds(minor, &fds);
        }

        self.table.release(minor);

        // A draining driver exits once the last socket is gone.
        if self.exit_left > 0 {
            self.exit_left -= 1;
            if self.exit_left == 0 {
                self.transport.terminate();
            }
        }

        Ok(())
    }

    /// Read from the socket's own buffer. Suspends when nothing is readable
    /// yet; with `NONBLOCK` the suspension is immediately cancelled and the
    /// caller sees would-block instead.
    pub fn read(
        &mut self,
        minor: Minor,
        endpt: Endpoint,
        grant: Grant,
        size: usize,
        flags: IoFlags,
        id: RequestId,
    ) -> Reply {
        trace!("read({minor})");

        if let Err(e) = self.table.guard(minor) {
            return Reply::Fail(e);
        }

        let rc = perform_read(&mut self.table, &mut self.transport, minor, endpt, grant, size, false);

        match rc {
            Reply::Suspend => self.suspend_io(minor, SuspendKind::Read, endpt, grant, size, flags, id),
            other => other,
        }
    }

    /// Write toward the destination socket's buffer. Suspension mirrors
    /// [`read`](Driver::read).
    pub fn write(
        &mut self,
        minor: Minor,
        endpt: Endpoint,
        grant: Grant,
        size: usize,
        flags: IoFlags,
        id: RequestId,
    ) -> Reply {
        trace!("write({minor})");

        if let Err(e) = self.table.guard(minor) {
            return Reply::Fail(e);
        }

        let rc = perform_write(&mut self.table, &mut self.transport, minor, endpt, grant, size, false);

        match rc {
            Reply::Suspend => self.suspend_io(minor, SuspendKind::Write, endpt, grant, size, flags, id),
            other => other,
        }
    }

    /// Dispatch a control request (bind, connect, listen, accept, shutdown,
    /// option and credential queries) to the control plane, and handle the
    /// suspension bookkeeping when the operation must wait for a peer.
    #[allow(clippy::too_many_arguments)]
    pub fn ioctl(
        &mut self,
        minor: Minor,
        request: u32,
        endpt: Endpoint,
        grant: Grant,
        flags: IoFlags,
        user_endpt: Endpoint,
        id: RequestId,
    ) -> Reply {
        trace!("ioctl({minor}, {request})");

        if let Err(e) = self.table.guard(minor) {
            return Reply::Fail(e);
        }

        // Every control touch refreshes the owner.
        self.table.set_owner(minor, user_endpt);

        let rc = self.control.do_ioctl(
            &mut self.table,
            &mut self.transport,
            minor,
            request,
            endpt,
            grant,
        );

        match rc {
            Control::Ok => Reply::Done(0),
            Control::Fail(e) => Reply::Fail(e),
            Control::Suspend(kind) => {
                let (kind, nonblock_err) = match kind {
                    ControlKind::Connect => (SuspendKind::Connect, SockErr::InProgress),
                    ControlKind::Accept => (SuspendKind::Accept, SockErr::WouldBlock),
                };
                // The grant length is meaningless for control requests.
                self.table.slot_mut(minor).suspended = Some(Suspension {
                    kind,
                    pending: Pending { endpt, grant, size: 0, id },
                });
                if flags.contains(IoFlags::NONBLOCK) {
                    wake::cancel(&mut self.table, minor, endpt, id);
                    Reply::Fail(nonblock_err)
                } else {
                    Reply::Suspend
                }
            }
        }
    }

    /// Probe readiness without side effects, and register edge notification
    /// for the ops that are not ready when `NOTIFY` is set.
    pub fn select(
        &mut self,
        minor: Minor,
        ops: SelectOps,
        endpt: Endpoint,
    ) -> Result<SelectOps, SockErr> {
        trace!("select({minor})");

        self.table.guard(minor)?;

        let watch = ops.contains(SelectOps::NOTIFY);
        let mut wanted = ops & (SelectOps::RD | SelectOps::WR | SelectOps::ERR);
        let mut ready = SelectOps::empty();

        if wanted.contains(SelectOps::RD) {
            let rc = perform_read(
                &mut self.table,
                &mut self.transport,
                minor,
                Endpoint::NONE,
                Grant::INVALID,
                1,
                true,
            );
            if matches!(rc, Reply::Done(n) if n > 0) {
                ready |= SelectOps::RD; // data available
            } else if self.table.is_listening(minor) {
                if self.table.backlog_pending(minor) {
                    ready |= SelectOps::RD; // pending connection
                }
            } else if rc != Reply::Suspend {
                ready |= SelectOps::RD; // error or end of stream
            }
        }

        if wanted.contains(SelectOps::WR) {
            let rc = perform_write(
                &mut self.table,
                &mut self.transport,
                minor,
                Endpoint::NONE,
                Grant::INVALID,
                1,
                true,
            );
            if rc != Reply::Done(0) && rc != Reply::Suspend {
                ready |= SelectOps::WR;
            }
        }

        // Ops not ready are remembered only when the caller asked to be
        // notified; a fired bit needs a fresh registration to fire again.
        wanted &= !ready;
        if !wanted.is_empty() && watch {
            let slot_sel = self.table.slot_mut(minor);
            slot_sel.sel_endpt = endpt;
            slot_sel.sel_ops |= wanted;
        }

        Ok(ready)
    }

    /// Cancel the pending request `(endpt, id)` on `minor`. The interrupted
    /// reply goes back to the original request; an unmatched cancel owes no
    /// reply at all.
    pub fn cancel(&mut self, minor: Minor, endpt: Endpoint, id: RequestId) -> Reply {
        trace!("cancel({minor})");

        if minor >= crate::NR_SOCKETS {
            return Reply::Suspend;
        }
        if !self.table.is_open(minor) {
            warn!("cancel request for a closed socket {minor}");
            return Reply::Suspend;
        }

        wake::cancel(&mut self.table, minor, endpt, id)
    }

    /// Begin draining: the driver exits once every live socket has closed,
    /// or immediately when there is none.
    pub fn terminate(&mut self) {
        self.exit_left = self.table.live_count();
        if self.exit_left == 0 {
            self.transport.terminate();
        }
    }

    /// Revive whatever `minor` is suspended on; the control plane calls this
    /// after completing a pairing.
    pub fn unsuspend(&mut self, minor: Minor) {
        wake::unsuspend(&mut self.table, &mut self.transport, minor);
    }

    pub fn table(&self) -> &SocketTable {
        &self.table
    }

    /// Seam access for control-plane work done outside an ioctl dispatch.
    /// Mutations must preserve the table's linkage invariants.
    pub fn table_mut(&mut self) -> &mut SocketTable {
        &mut self.table
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Record a blocked read/write and translate for non-blocking callers.
    #[allow(clippy::too_many_arguments)]
    fn suspend_io(
        &mut self,
        minor: Minor,
        kind: SuspendKind,
        endpt: Endpoint,
        grant: Grant,
        size: usize,
        flags: IoFlags,
        id: RequestId,
    ) -> Reply {
        self.table.slot_mut(minor).suspended = Some(Suspension {
            kind,
            pending: Pending { endpt, grant, size, id },
        });

        if flags.contains(IoFlags::NONBLOCK) {
            wake::cancel(&mut self.table, minor, endpt, id);
            return Reply::Fail(SockErr::WouldBlock);
        }

        Reply::Suspend
    }
}
