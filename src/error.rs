// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Domain errors surfaced to socket clients, with their host errno mapping.

use std::fmt;

/// Everything a socket operation can fail with.
///
/// The variants are the domain-level taxonomy; [`SockErr::errno`] maps them
/// to the platform's numeric codes for the character-device reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockErr {
    /// Handle out of table range.
    BadHandle,
    /// Slot exists but is not open.
    NotOpen,
    /// No free slot left in the socket table.
    NoSlots,
    /// Ring buffer acquisition failed.
    NoMemory,
    /// I/O on a shut-down half (own read half, or peer's read half).
    BrokenPipe,
    /// Connection-oriented operation without a peer and no sticky error.
    NotConnected,
    /// Sticky error left behind by a peer teardown; consumed by the next I/O.
    ConnReset,
    /// Datagram or seqpacket message larger than the ring buffer.
    MsgTooLarge,
    /// Datagram target address has no bound receiver.
    NoSuchFile,
    /// Non-blocking variant of a suspension.
    WouldBlock,
    /// Non-blocking variant of a connect suspension.
    InProgress,
    /// The pending request was cancelled.
    Interrupted,
    /// A safe-copy primitive failed; the transport's code is carried through.
    CopyFault(i32),
}

impl SockErr {
    /// The platform errno value for this error.
    pub fn errno(self) -> i32 {
        match self {
            SockErr::BadHandle => libc::ENXIO,
            SockErr::NotOpen => libc::EINVAL,
            SockErr::NoSlots => libc::ENFILE,
            SockErr::NoMemory => libc::ENOMEM,
            SockErr::BrokenPipe => libc::EPIPE,
            SockErr::NotConnected => libc::ENOTCONN,
            SockErr::ConnReset => libc::ECONNRESET,
            SockErr::MsgTooLarge => libc::EMSGSIZE,
            SockErr::NoSuchFile => libc::ENOENT,
            SockErr::WouldBlock => libc::EAGAIN,
            SockErr::InProgress => libc::EINPROGRESS,
            SockErr::Interrupted => libc::EINTR,
            SockErr::CopyFault(code) => code,
        }
    }
}

impl fmt::Display for SockErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SockErr::BadHandle => "handle out of range",
            SockErr::NotOpen => "socket not open",
            SockErr::NoSlots => "socket table full",
            SockErr::NoMemory => "out of buffer memory",
            SockErr::BrokenPipe => "broken pipe",
            SockErr::NotConnected => "socket not connected",
            SockErr::ConnReset => "connection reset by peer",
            SockErr::MsgTooLarge => "message too large",
            SockErr::NoSuchFile => "no receiver bound at target address",
            SockErr::WouldBlock => "operation would block",
            SockErr::InProgress => "connection in progress",
            SockErr::Interrupted => "interrupted",
            SockErr::CopyFault(code) => return write!(f, "safe-copy failure ({code})"),
        };
        f.write_str(msg)
    }
}

impl std::error::Error for SockErr {}
