// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The seam toward the character-device transport.
//
// The transport dispatches requests into the driver and owns the reply
// channel back to clients. Two reply paths exist: the immediate return value
// of a callback, and the deferred `reply_task`/`reply_select` primitives
// used when a suspended request is revived later.

use bitflags::bitflags;

use crate::{Minor, SockErr};

/// A process endpoint known to the transport. `NONE` marks pretend calls
/// that never touch client memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(pub i32);

impl Endpoint {
    pub const NONE: Endpoint = Endpoint(-1);
}

/// A memory grant: a safe-copy window into the requester's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grant(pub i32);

impl Grant {
    pub const INVALID: Grant = Grant(-1);
}

/// Identifies one pending request, for deferred replies and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u32);

bitflags! {
    /// Select operations, plus the notify bit requesting edge notification
    /// for the ops that are not ready yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SelectOps: u8 {
        const RD = 0b0001;
        const WR = 0b0010;
        const ERR = 0b0100;
        const NOTIFY = 0b1000;
    }
}

bitflags! {
    /// Per-request flags passed by the transport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IoFlags: u8 {
        const NONBLOCK = 0b0001;
    }
}

/// Outcome of a driver callback, as seen by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Reply now with a byte count (zero doubles as plain success).
    Done(usize),
    /// Reply now with an error.
    Fail(SockErr),
    /// Withhold the reply: the request stays pending and is answered later
    /// through [`Transport::reply_task`]. Inside the data path this is the
    /// would-block marker.
    Suspend,
}

/// The primitives the driver consumes from the character-device transport.
pub trait Transport {
    /// Copy `data` into the requester's grant window at `offset`.
    fn copy_to(
        &mut self,
        endpt: Endpoint,
        grant: Grant,
        offset: usize,
        data: &[u8],
    ) -> Result<(), SockErr>;

    /// Copy from the requester's grant window at `offset` into `data`.
    fn copy_from(
        &mut self,
        endpt: Endpoint,
        grant: Grant,
        offset: usize,
        data: &mut [u8],
    ) -> Result<(), SockErr>;

    /// Deliver the deferred reply for a previously suspended request.
    fn reply_task(&mut self, endpt: Endpoint, id: RequestId, result: Result<usize, SockErr>);

    /// Notify a select registrant that `ops` became ready on `minor`.
    fn reply_select(&mut self, endpt: Endpoint, minor: Minor, ops: SelectOps);

    /// Tear the transport down; called once the last socket of a draining
    /// driver closes.
    fn terminate(&mut self);
}
