// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The socket table: a fixed array of slots indexed by minor number.
//
// The table owns slot allocation and teardown and is the seam the control
// plane mutates slots through. The seam methods keep the linkage invariants:
// a connected pair points at each other, a connecting socket points at a
// listener whose backlog holds it, and a listener never has a peer.

use crate::addr::SockAddr;
use crate::ring::Ring;
use crate::slot::{Ancillary, Minor, Mode, Slot, SockType, SuspendKind};
use crate::transport::Endpoint;
use crate::{SockErr, BACKLOG_MAX, BUF_SIZE, NR_SOCKETS};

/// Fixed-size table of socket slots. Minor 0 is reserved for the root
/// device; live sockets occupy minors `1..NR_SOCKETS`.
pub struct SocketTable {
    slots: Vec<Option<Slot>>,
}

impl SocketTable {
    /// An empty table, all slots free.
    pub fn new() -> Self {
        Self { slots: (0..NR_SOCKETS).map(|_| None).collect() }
    }

    pub fn is_open(&self, minor: Minor) -> bool {
        minor < NR_SOCKETS && self.slots[minor].is_some()
    }

    /// Live sockets, for the draining count.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Range and open guard shared by every callback.
    pub(crate) fn guard(&self, minor: Minor) -> Result<(), SockErr> {
        if minor >= NR_SOCKETS {
            return Err(SockErr::BadHandle);
        }
        if self.slots[minor].is_none() {
            return Err(SockErr::NotOpen);
        }
        Ok(())
    }

    /// The slot for an open minor. Callers guard first; a miss here is a
    /// driver bug.
    pub(crate) fn slot(&self, minor: Minor) -> &Slot {
        self.slots[minor].as_ref().expect("socket not open")
    }

    pub(crate) fn slot_mut(&mut self, minor: Minor) -> &mut Slot {
        self.slots[minor].as_mut().expect("socket not open")
    }

    /// Allocate the smallest free minor and its ring buffer.
    pub(crate) fn allocate(&mut self, owner: Endpoint) -> Result<Minor, SockErr> {
        let minor = (1..NR_SOCKETS)
            .find(|&m| self.slots[m].is_none())
            .ok_or(SockErr::NoSlots)?;
        // Buffer acquisition may fail; the slot then stays free.
        let ring = Ring::with_capacity(BUF_SIZE)?;
        self.slots[minor] = Some(Slot::new(owner, ring));
        Ok(minor)
    }

    /// Free a slot, dropping its ring with it.
    pub(crate) fn release(&mut self, minor: Minor) -> Slot {
        self.slots[minor].take().expect("socket not open")
    }

    /// Find the datagram receiver bound at `target`: the first slot of type
    /// DGRAM whose bound UNIX address carries the same path. Linear scan;
    /// the table is small.
    pub fn lookup_dgram_receiver(&self, target: &SockAddr) -> Option<Minor> {
        (0..NR_SOCKETS).find(|&m| {
            self.slots[m].as_ref().is_some_and(|s| {
                s.ty == SockType::Dgram && s.addr.is_unix() && s.addr.same_path(target)
            })
        })
    }

    // -----------------------------------------------------------------------
    // Slot state queries
    // -----------------------------------------------------------------------

    pub fn sock_type(&self, minor: Minor) -> SockType {
        self.slot(minor).ty
    }

    pub fn mode(&self, minor: Minor) -> Mode {
        self.slot(minor).mode
    }

    pub fn owner(&self, minor: Minor) -> Endpoint {
        self.slot(minor).owner
    }

    pub fn peer(&self, minor: Minor) -> Option<Minor> {
        self.slot(minor).peer
    }

    pub fn is_listening(&self, minor: Minor) -> bool {
        self.slot(minor).listening
    }

    pub fn child(&self, minor: Minor) -> Option<Minor> {
        self.slot(minor).child
    }

    pub fn local_addr(&self, minor: Minor) -> &SockAddr {
        &self.slot(minor).addr
    }

    pub fn target_addr(&self, minor: Minor) -> &SockAddr {
        &self.slot(minor).target
    }

    pub fn source_addr(&self, minor: Minor) -> &SockAddr {
        &self.slot(minor).source
    }

    /// Bytes queued for this socket's reader.
    pub fn buffered(&self, minor: Minor) -> usize {
        self.slot(minor).ring.len()
    }

    /// The kind of operation the slot is suspended on, if any.
    pub fn suspension(&self, minor: Minor) -> Option<SuspendKind> {
        self.slot(minor).suspend_kind()
    }

    /// Whether any connecting socket is queued on this listener.
    pub fn backlog_pending(&self, listener: Minor) -> bool {
        self.slot(listener).backlog.iter().any(|e| e.is_some())
    }

    // -----------------------------------------------------------------------
    // Control-plane seam: mutators
    //
    // Control routines observe and mutate slot state only through these;
    // each one preserves the table invariants on its own.
    // -----------------------------------------------------------------------

    /// Assign the socket type on first use.
    pub fn set_sock_type(&mut self, minor: Minor, ty: SockType) {
        self.slot_mut(minor).ty = ty;
    }

    /// Bind the local name.
    pub fn bind_addr(&mut self, minor: Minor, addr: SockAddr) {
        self.slot_mut(minor).addr = addr;
    }

    /// Set the datagram send destination.
    pub fn set_target_addr(&mut self, minor: Minor, target: SockAddr) {
        self.slot_mut(minor).target = target;
    }

    /// Clear mode bits for a half-shutdown. I/O on a cleared half fails
    /// with broken-pipe from then on.
    pub fn shutdown(&mut self, minor: Minor, halves: Mode) {
        let slot = self.slot_mut(minor);
        slot.mode &= !halves;
    }

    /// Turn the socket into a listener with the given backlog size
    /// (clamped to `BACKLOG_MAX`). Listeners have no peer.
    pub fn listen(&mut self, minor: Minor, backlog: usize) {
        let slot = self.slot_mut(minor);
        assert!(slot.peer.is_none(), "listen on a linked socket");
        slot.listening = true;
        slot.backlog.resize(backlog.clamp(1, BACKLOG_MAX), None);
    }

    /// Queue `client` on a listener and point it at its future server.
    /// Returns false when the backlog is full.
    pub fn enqueue_connecting(&mut self, listener: Minor, client: Minor) -> bool {
        assert!(self.slot(listener).listening, "backlog on a non-listening socket");
        let Some(entry) = self.slot_mut(listener).backlog.iter_mut().find(|e| e.is_none())
        else {
            return false;
        };
        *entry = Some(client);
        self.slot_mut(client).peer = Some(listener);
        true
    }

    /// Pop the oldest queued connecting socket off a listener.
    pub fn dequeue_connecting(&mut self, listener: Minor) -> Option<Minor> {
        let backlog = &mut self.slot_mut(listener).backlog;
        for entry in backlog.iter_mut() {
            if let Some(client) = entry.take() {
                return Some(client);
            }
        }
        None
    }

    /// Drop one specific connecting socket from a listener's backlog.
    pub(crate) fn remove_connecting(&mut self, listener: Minor, client: Minor) {
        for entry in self.slot_mut(listener).backlog.iter_mut() {
            if *entry == Some(client) {
                *entry = None;
                break;
            }
        }
    }

    /// Link two sockets as a connected pair.
    pub fn connect_pair(&mut self, a: Minor, b: Minor) {
        self.slot_mut(a).peer = Some(b);
        self.slot_mut(b).peer = Some(a);
    }

    /// Attach a connecting socket to `minor` during a partial accept.
    pub fn set_child(&mut self, minor: Minor, child: Minor) {
        self.slot_mut(minor).child = Some(child);
    }

    pub fn clear_child(&mut self, minor: Minor) {
        self.slot_mut(minor).child = None;
    }

    /// Park an error to be delivered by the next wake-up (or the next I/O,
    /// for the sticky connection-reset).
    pub fn set_pending_err(&mut self, minor: Minor, err: SockErr) {
        self.slot_mut(minor).err = Some(err);
    }

    /// Pending out-of-band payload for this socket.
    pub fn ancillary(&self, minor: Minor) -> &Ancillary {
        &self.slot(minor).ancillary
    }

    pub fn ancillary_mut(&mut self, minor: Minor) -> &mut Ancillary {
        &mut self.slot_mut(minor).ancillary
    }

    pub(crate) fn set_owner(&mut self, minor: Minor, owner: Endpoint) {
        self.slot_mut(minor).owner = owner;
    }
}

impl Default for SocketTable {
    fn default() -> Self {
        Self::new()
    }
}
