// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// One socket slot: everything the driver knows about a live socket.

use bitflags::bitflags;

use crate::addr::SockAddr;
use crate::ring::Ring;
use crate::transport::{Endpoint, Grant, RequestId, SelectOps};
use crate::{SockErr, BACKLOG_MAX};

/// Slot handle: the index into the socket table, and the minor number the
/// transport sees. Minor 0 is the root device and never owns a slot.
pub type Minor = usize;

bitflags! {
    /// The two independently shut-downable halves of a socket.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mode: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
    }
}

/// Socket type, fixed by the control plane on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockType {
    /// No type assigned yet.
    Unset,
    /// Connection-oriented byte stream; writes may be split on buffer space.
    Stream,
    /// Connection-oriented with message boundaries; one message in flight.
    SeqPacket,
    /// Connectionless, routed by bound address; lossy when the receiver is
    /// backed up.
    Dgram,
}

/// Which operation a slot is suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendKind {
    Read,
    Write,
    Connect,
    Accept,
}

/// Identity and memory grant of the requester awaiting a deferred reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub endpt: Endpoint,
    pub grant: Grant,
    pub size: usize,
    pub id: RequestId,
}

/// The single blocked operation a slot may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suspension {
    pub kind: SuspendKind,
    pub pending: Pending,
}

/// Credentials travelling with a message, for credential passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cred {
    pub pid: libc::pid_t,
    pub uid: libc::uid_t,
    pub gid: libc::gid_t,
}

/// Out-of-band payload queued for delivery with the next receive.
///
/// The descriptors are foreign handles owned by the control plane; the slot
/// only parks them. On close they are handed back through the seam for
/// release.
#[derive(Debug, Default)]
pub struct Ancillary {
    pub fds: Vec<i32>,
    pub cred: Option<Cred>,
}

impl Ancillary {
    pub fn is_empty(&self) -> bool {
        self.fds.is_empty() && self.cred.is_none()
    }

    pub fn clear(&mut self) {
        self.fds.clear();
        self.cred = None;
    }
}

/// A live socket.
///
/// The table hands these out only for open minors; a freed slot does not
/// exist (and its ring is gone with it).
#[derive(Debug)]
pub struct Slot {
    /// Process that created the socket; refreshed on every control call.
    pub(crate) owner: Endpoint,
    pub(crate) ty: SockType,
    pub(crate) mode: Mode,
    /// Bytes destined for this socket's reader, deposited by its peer.
    pub(crate) ring: Ring,
    /// Local bind name.
    pub(crate) addr: SockAddr,
    /// Datagram send destination.
    pub(crate) target: SockAddr,
    /// Origin of the last received datagram.
    pub(crate) source: SockAddr,
    /// Connected peer, or the listener a connecting socket is queued on.
    pub(crate) peer: Option<Minor>,
    pub(crate) listening: bool,
    /// Connecting socket attached during a partial accept.
    pub(crate) child: Option<Minor>,
    /// Queued connecting minors; length is the accepted backlog size.
    pub(crate) backlog: Vec<Option<Minor>>,
    pub(crate) ancillary: Ancillary,
    /// Sticky error handed to the next I/O, then cleared.
    pub(crate) err: Option<SockErr>,
    pub(crate) suspended: Option<Suspension>,
    /// Last select registrant and the ops it has not been notified about.
    pub(crate) sel_endpt: Endpoint,
    pub(crate) sel_ops: SelectOps,
}

impl Slot {
    /// Fresh slot with open defaults: both halves open, no type, no linkage,
    /// full-size empty backlog, nothing pending.
    pub(crate) fn new(owner: Endpoint, ring: Ring) -> Self {
        Self {
            owner,
            ty: SockType::Unset,
            mode: Mode::READ | Mode::WRITE,
            ring,
            addr: SockAddr::zeroed(),
            target: SockAddr::zeroed(),
            source: SockAddr::zeroed(),
            peer: None,
            listening: false,
            child: None,
            backlog: vec![None; BACKLOG_MAX],
            ancillary: Ancillary::default(),
            err: None,
            suspended: None,
            sel_endpt: Endpoint::NONE,
            sel_ops: SelectOps::empty(),
        }
    }

    pub(crate) fn suspend_kind(&self) -> Option<SuspendKind> {
        self.suspended.map(|s| s.kind)
    }
}
