// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// User-space UNIX domain socket driver core.
//
// One pseudo-device multiplexes a table of sockets: opening the root device
// allocates a fresh slot, and every later request targets one slot by its
// minor number. Payload moves between peers through per-socket ring buffers
// with stream, seqpacket and datagram framing; blocked operations suspend
// into their slot and are revived by the peer-side state change.
//
// The character-device transport (request dispatch, replies, memory grants)
// and the socket-control plane (bind/connect/listen/accept/shutdown) are
// external collaborators behind the `Transport` and `ControlPlane` traits.

mod addr;
mod control;
mod driver;
mod error;
mod ring;
mod slot;
mod table;
mod transport;
mod wake;
mod xfer;

pub use addr::SockAddr;
pub use control::{Control, ControlKind, ControlPlane};
pub use driver::Driver;
pub use error::SockErr;
pub use ring::Ring;
pub use slot::{Ancillary, Cred, Minor, Mode, Pending, SockType, SuspendKind, Suspension};
pub use table::SocketTable;
pub use transport::{Endpoint, Grant, IoFlags, Reply, RequestId, SelectOps, Transport};
pub use wake::unsuspend;

/// Ring buffer capacity per socket, in bytes.
pub const BUF_SIZE: usize = 32768;

/// Socket table size; minor 0 is the root device and never holds a socket.
pub const NR_SOCKETS: usize = 256;

/// Upper bound on a listener's backlog.
pub const BACKLOG_MAX: usize = 64;

/// Bounded length of a path-style socket address.
pub const UNIX_PATH_MAX: usize = 104;
