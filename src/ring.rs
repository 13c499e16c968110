// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Per-socket byte ring buffer.
//
// Position+size representation: `pos` is the tail (next byte to read), the
// head is `(pos + size) % capacity`. Reads and writes each split into at
// most two contiguous segments around the wrap point; the caller copies
// through the segments and then commits the byte count.

use crate::SockErr;

/// A byte ring buffer of fixed capacity.
///
/// Holds the payload destined for one socket's reader. The accessor/commit
/// split exists because the actual copies go through the transport's
/// safe-copy primitives:
///
/// - reader side: [`read_slices`] then [`read_commit`]
/// - writer side: [`write_slices`] then [`write_commit`]
///
/// [`read_slices`]: Ring::read_slices
/// [`read_commit`]: Ring::read_commit
/// [`write_slices`]: Ring::write_slices
/// [`write_commit`]: Ring::write_commit
pub struct Ring {
    buf: Vec<u8>,
    pos: usize,
    size: usize,
}

impl Ring {
    /// Acquire a ring of `capacity` bytes. Allocation failure is reported
    /// rather than aborting, so an open can fail cleanly with no-memory.
    pub fn with_capacity(capacity: usize) -> Result<Self, SockErr> {
        assert!(capacity > 0, "ring capacity must be non-zero");
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity).map_err(|_| SockErr::NoMemory)?;
        buf.resize(capacity, 0);
        Ok(Self { buf, pos: 0, size: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == self.buf.len()
    }

    /// Free space left for a writer.
    pub fn free(&self) -> usize {
        self.buf.len() - self.size
    }

    /// Tail position (next byte to read). Zero whenever the ring is empty.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The next `n` readable bytes as up to two segments (`n <= len()`).
    /// The second segment is empty unless the data wraps.
    pub fn read_slices(&self, n: usize) -> (&[u8], &[u8]) {
        debug_assert!(n <= self.size);
        let cap = self.buf.len();
        if self.pos + n <= cap {
            (&self.buf[self.pos..self.pos + n], &[])
        } else {
            (&self.buf[self.pos..], &self.buf[..n - (cap - self.pos)])
        }
    }

    /// Consume `n` bytes from the tail. Resets the position to zero when the
    /// ring drains empty, keeping the next fill contiguous.
    pub fn read_commit(&mut self, n: usize) {
        debug_assert!(n <= self.size);
        self.pos = (self.pos + n) % self.buf.len();
        self.size -= n;
        if self.size == 0 {
            self.pos = 0;
        }
    }

    /// The next `n` writable bytes at the head as up to two segments
    /// (`n <= free()`).
    pub fn write_slices(&mut self, n: usize) -> (&mut [u8], &mut [u8]) {
        debug_assert!(n <= self.free());
        let cap = self.buf.len();
        let head = (self.pos + self.size) % cap;
        if head + n <= cap {
            (&mut self.buf[head..head + n], &mut [])
        } else {
            let (lo, hi) = self.buf.split_at_mut(head);
            let wrap = n - (cap - head);
            (hi, &mut lo[..wrap])
        }
    }

    /// Publish `n` bytes written through [`write_slices`](Ring::write_slices).
    pub fn write_commit(&mut self, n: usize) {
        debug_assert!(n <= self.free());
        self.size += n;
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.pos = 0;
        self.size = 0;
    }
}

impl std::fmt::Debug for Ring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.buf.len())
            .field("pos", &self.pos)
            .field("size", &self.size)
            .finish()
    }
}
