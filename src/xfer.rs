// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The peer-to-peer data path.
//
// A write on one socket deposits into the buffer of the destination socket
// (the connected peer, or the address-matched datagram receiver); a read
// drains the socket's own buffer. Both come in a `pretend` flavor that
// computes the outcome without side effects — select and the blocking
// gating run on pretend calls.
//
// Framing rules by type:
//   STREAM    — byte stream; writes clamp to free space (partial writes).
//   SEQPACKET — one message in flight; writes only land in an empty buffer
//               and a read consumes the whole message, discarding residue.
//   DGRAM     — routed by bound path; never split; silently dropped when
//               the receiver's buffer is occupied.

use log::trace;

use crate::slot::{Minor, Mode, SockType, SuspendKind};
use crate::table::SocketTable;
use crate::transport::{Endpoint, Grant, Reply, SelectOps, Transport};
use crate::wake::unsuspend;
use crate::{SockErr, BUF_SIZE};

/// Drain up to `size` bytes from `minor`'s own buffer into the requester's
/// grant. With `pretend`, reports what a real call would do and changes
/// nothing (except that even a pretend call never consumes the sticky
/// reset error).
pub(crate) fn perform_read<T: Transport>(
    table: &mut SocketTable,
    transport: &mut T,
    minor: Minor,
    endpt: Endpoint,
    grant: Grant,
    mut size: usize,
    pretend: bool,
) -> Reply {
    trace!("perform_read({minor}), size {size}, pretend {pretend}");

    let peer = table.slot(minor).peer;

    if size == 0 {
        return Reply::Done(0);
    }

    if !table.slot(minor).mode.contains(Mode::READ) {
        return Reply::Fail(SockErr::BrokenPipe);
    }

    if table.slot(minor).ring.is_empty() {
        if peer.is_none() {
            // Connection-oriented sockets need a peer to read from; a
            // datagram socket just waits for a sender to show up.
            let ty = table.slot(minor).ty;
            if matches!(ty, SockType::Stream | SockType::SeqPacket) {
                let slot = table.slot_mut(minor);
                if slot.err == Some(SockErr::ConnReset) {
                    if !pretend {
                        slot.err = None;
                    }
                    return Reply::Fail(SockErr::ConnReset);
                }
                return Reply::Fail(SockErr::NotConnected);
            }
        }

        // Peer's write half gone and nothing buffered: end of stream.
        if let Some(p) = peer {
            if !table.slot(p).mode.contains(Mode::WRITE) {
                return Reply::Done(0);
            }
        }

        if pretend {
            return Reply::Suspend;
        }

        if let Some(p) = peer {
            if table.slot(p).suspend_kind() == Some(SuspendKind::Write) {
                panic!("writer suspended on an empty peer buffer");
            }
        }

        trace!("suspending read request on {minor}");
        return Reply::Suspend;
    }

    let buffered = table.slot(minor).ring.len();
    if size > buffered {
        size = buffered;
    }

    if pretend {
        return Reply::Done(size);
    }

    // Copy from the buffer tail, in up to two wrap segments, then consume.
    {
        let slot = table.slot_mut(minor);
        let (lo, hi) = slot.ring.read_slices(size);
        if let Err(e) = transport.copy_to(endpt, grant, 0, lo) {
            return Reply::Fail(e);
        }
        if !hi.is_empty() {
            if let Err(e) = transport.copy_to(endpt, grant, lo.len(), hi) {
                return Reply::Fail(e);
            }
        }
        if slot.ty == SockType::SeqPacket {
            // A packet is consumed whole; a short read drops the residue.
            slot.ring.clear();
        } else {
            slot.ring.read_commit(size);
        }
    }

    if let Some(p) = peer {
        // The peer writes into the buffer just drained.
        if table.slot(p).suspend_kind() == Some(SuspendKind::Write) {
            unsuspend(table, transport, p);
        }

        if table.slot(p).sel_ops.contains(SelectOps::WR)
            && table.slot(minor).ring.len() < BUF_SIZE
        {
            let pslot = table.slot_mut(p);
            pslot.sel_ops.remove(SelectOps::WR);
            let sel_endpt = pslot.sel_endpt;
            transport.reply_select(sel_endpt, p, SelectOps::WR);
        }
    }

    Reply::Done(size)
}

/// Deposit up to `size` bytes from the requester's grant into the
/// destination socket's buffer. Destination is the peer for
/// connection-oriented sockets, or the receiver bound at the target address
/// for datagrams.
pub(crate) fn perform_write<T: Transport>(
    table: &mut SocketTable,
    transport: &mut T,
    minor: Minor,
    endpt: Endpoint,
    grant: Grant,
    mut size: usize,
    pretend: bool,
) -> Reply {
    trace!("perform_write({minor}), size {size}, pretend {pretend}");

    if size == 0 {
        return Reply::Done(0);
    }

    if !table.slot(minor).mode.contains(Mode::WRITE) {
        return Reply::Fail(SockErr::BrokenPipe);
    }

    let ty = table.slot(minor).ty;

    // Everything but a stream must preserve message boundaries, so the
    // message has to fit in the buffer entirely.
    if size > BUF_SIZE && ty != SockType::Stream {
        return Reply::Fail(SockErr::MsgTooLarge);
    }

    let dest = match ty {
        SockType::Stream | SockType::SeqPacket => match table.slot(minor).peer {
            None => {
                let slot = table.slot_mut(minor);
                if slot.err == Some(SockErr::ConnReset) {
                    if !pretend {
                        slot.err = None;
                    }
                    return Reply::Fail(SockErr::ConnReset);
                }
                return Reply::Fail(SockErr::NotConnected);
            }
            Some(p) => {
                if table.slot(p).peer.is_none() {
                    // Still connecting; the write waits for the accept.
                    return Reply::Suspend;
                }
                p
            }
        },
        _ => {
            // Datagram routing: the receiver bound at the target path.
            match table.lookup_dgram_receiver(table.target_addr(minor)) {
                Some(d) => d,
                None => return Reply::Fail(SockErr::NoSuchFile),
            }
        }
    };

    if !table.slot(dest).mode.contains(Mode::READ) {
        return Reply::Fail(SockErr::BrokenPipe);
    }

    // Datagram boundary rule: a packet already waiting means this one is
    // silently dropped — the sender still sees success.
    if ty == SockType::Dgram && !table.slot(dest).ring.is_empty() {
        return Reply::Done(size);
    }

    // Flow-control gate: a full buffer blocks everyone; seqpacket also
    // blocks until the previous message is consumed.
    if table.slot(dest).ring.is_full()
        || (ty == SockType::SeqPacket && !table.slot(dest).ring.is_empty())
    {
        if pretend {
            return Reply::Suspend;
        }

        if table.slot(dest).suspend_kind() == Some(SuspendKind::Read) {
            panic!("reader suspended on an occupied buffer");
        }

        trace!("suspending write request on {minor}");
        return Reply::Suspend;
    }

    // Streams take what fits; seqpacket and dgram messages fit entirely by
    // the size and gating checks above.
    let free = table.slot(dest).ring.free();
    if size > free {
        size = free;
    }

    if pretend {
        return Reply::Done(size);
    }

    // Copy to the buffer head, in up to two wrap segments, then publish.
    {
        let dslot = table.slot_mut(dest);
        let (lo, hi) = dslot.ring.write_slices(size);
        if let Err(e) = transport.copy_from(endpt, grant, 0, lo) {
            return Reply::Fail(e);
        }
        if !hi.is_empty() {
            let off = lo.len();
            if let Err(e) = transport.copy_from(endpt, grant, off, hi) {
                return Reply::Fail(e);
            }
        }
        dslot.ring.write_commit(size);
    }

    // Stamp the origin returned by recvfrom.
    if ty == SockType::Dgram {
        let from = *table.local_addr(minor);
        table.slot_mut(dest).source = from;
    }

    if table.slot(dest).suspend_kind() == Some(SuspendKind::Read) {
        unsuspend(table, transport, dest);
    }

    if table.slot(dest).sel_ops.contains(SelectOps::RD) && !table.slot(dest).ring.is_empty() {
        let dslot = table.slot_mut(dest);
        dslot.sel_ops.remove(SelectOps::RD);
        let sel_endpt = dslot.sel_endpt;
        transport.reply_select(sel_endpt, dest, SelectOps::RD);
    }

    Reply::Done(size)
}
