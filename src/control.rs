// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The seam toward the socket-control plane.
//
// Bind, connect, listen, accept, shutdown, option queries and descriptor
// passing all arrive as control requests on a socket's handle. The driver
// owns the dispatch bookkeeping (guards, owner refresh, suspension of
// connect/accept, non-blocking translation); the operations themselves live
// behind this trait.

use crate::slot::Minor;
use crate::table::SocketTable;
use crate::transport::{Endpoint, Grant, Transport};
use crate::SockErr;

/// The control operations that may leave the caller waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Connect,
    Accept,
}

/// Outcome of a control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Completed; reply success.
    Ok,
    /// Failed; reply the error.
    Fail(SockErr),
    /// The caller must wait for a peer. The driver records the suspension;
    /// the eventual pairing (or failure) is delivered through
    /// [`unsuspend`](crate::unsuspend) with the slot's parked error.
    Suspend(ControlKind),
}

/// The socket-control layer.
///
/// Handlers mutate slot state only through the [`SocketTable`] seam methods
/// and must leave the linkage invariants intact: bidirectional peers for
/// connected pairs, backlog membership for connecting sockets, no peer on a
/// listener. After completing a pairing, a handler calls
/// [`unsuspend`](crate::unsuspend) on the waiting side.
pub trait ControlPlane<T: Transport> {
    /// Handle one control request on `minor`.
    fn do_ioctl(
        &mut self,
        table: &mut SocketTable,
        transport: &mut T,
        minor: Minor,
        request: u32,
        endpt: Endpoint,
        grant: Grant,
    ) -> Control;

    /// Release descriptors still parked on a closing socket.
    fn release_fds(&mut self, minor: Minor, fds: &[i32]) {
        let _ = (minor, fds);
    }
}
