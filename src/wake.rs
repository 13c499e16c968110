// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The suspend/wake/cancel engine.
//
// A slot holds at most one blocked operation, recorded with the requester's
// identity and grant. State changes on the partner side (a drain, a fill, a
// pairing, a teardown) call `unsuspend`, which either completes the parked
// request through the transport or leaves it waiting.

use log::trace;

use crate::slot::{Minor, SuspendKind};
use crate::table::SocketTable;
use crate::transport::{Endpoint, Reply, RequestId, SelectOps, Transport};
use crate::xfer::{perform_read, perform_write};
use crate::{SockErr, NR_SOCKETS};

/// Retry the operation `minor` is suspended on.
///
/// For a blocked read or write the data path runs again with the saved
/// request; if it still cannot complete, the suspension stays. For connect
/// and accept the control plane has already linked the peers — the parked
/// error (or success) is all that is left to deliver.
///
/// Calling this on a slot with nothing pending is a driver bug.
pub fn unsuspend<T: Transport>(table: &mut SocketTable, transport: &mut T, minor: Minor) {
    let Some(susp) = table.slot(minor).suspended else {
        panic!("unsuspend on a socket with no pending operation");
    };

    let result = match susp.kind {
        SuspendKind::Read => {
            match perform_read(
                table,
                transport,
                minor,
                susp.pending.endpt,
                susp.pending.grant,
                susp.pending.size,
                false,
            ) {
                Reply::Suspend => return, // still blocked
                Reply::Done(n) => Ok(n),
                Reply::Fail(e) => Err(e),
            }
        }
        SuspendKind::Write => {
            match perform_write(
                table,
                transport,
                minor,
                susp.pending.endpt,
                susp.pending.grant,
                susp.pending.size,
                false,
            ) {
                Reply::Suspend => return,
                Reply::Done(n) => Ok(n),
                Reply::Fail(e) => Err(e),
            }
        }
        SuspendKind::Connect | SuspendKind::Accept => {
            // The pairing is done; deliver its outcome.
            match table.slot_mut(minor).err.take() {
                None => Ok(0),
                Some(e) => Err(e),
            }
        }
    };

    transport.reply_task(susp.pending.endpt, susp.pending.id, result);
    table.slot_mut(minor).suspended = None;
}

/// Tear a socket away from its closing peer: unlink, park the sticky reset
/// error, revive anything blocked on it, and fire every registered select
/// interest so watchers notice the failure immediately.
pub(crate) fn reset<T: Transport>(table: &mut SocketTable, transport: &mut T, minor: Minor) {
    trace!("reset({minor})");

    let slot = table.slot_mut(minor);
    slot.peer = None;
    slot.err = Some(SockErr::ConnReset);

    if table.slot(minor).suspended.is_some() {
        unsuspend(table, transport, minor);
    }

    let slot = table.slot_mut(minor);
    if !slot.sel_ops.is_empty() {
        let ops = slot.sel_ops;
        let sel_endpt = slot.sel_endpt;
        slot.sel_ops = SelectOps::empty();
        transport.reply_select(sel_endpt, minor, ops);
    }
}

/// Cancel the pending request `(endpt, id)` on `minor`.
///
/// Returns the interrupted reply for the original request when the
/// suspension matched, or `Suspend` (no reply owed) when there was nothing
/// matching to cancel — stale cancels happen during teardown races.
pub(crate) fn cancel(
    table: &mut SocketTable,
    minor: Minor,
    endpt: Endpoint,
    id: RequestId,
) -> Reply {
    let Some(susp) = table.slot(minor).suspended else {
        return Reply::Suspend;
    };
    if susp.pending.endpt != endpt || susp.pending.id != id {
        return Reply::Suspend;
    }

    match susp.kind {
        SuspendKind::Accept => {
            // A partial accept left this socket attached as somebody's
            // pending child; detach it.
            for m in 0..NR_SOCKETS {
                if table.is_open(m) && table.slot(m).child == Some(minor) {
                    table.slot_mut(m).child = None;
                }
            }
        }
        SuspendKind::Connect => {
            // The connection stays queued and completes asynchronously;
            // only the caller's interest is severed.
        }
        SuspendKind::Read | SuspendKind::Write => {
            // Nothing to roll back.
        }
    }

    table.slot_mut(minor).suspended = None;

    Reply::Fail(SockErr::Interrupted)
}
