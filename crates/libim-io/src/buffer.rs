//! Fixed-capacity staging buffer for outgoing bytes.
//!
//! The channel stages writes here and hands the staged region to the native
//! handle in one OS call when the buffer fills, on seek, and on close. The
//! buffer never grows: a full buffer accepts zero bytes and the owner is
//! expected to flush and retry.

/// Default staging capacity (4 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// A write buffer with a fixed capacity and an append cursor.
///
/// Bytes past the cursor are stale and never observed.
#[derive(Debug)]
pub struct FixedWriteBuffer {
    data: Box<[u8]>,
    cursor: usize,
}

impl FixedWriteBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "write buffer capacity must be non-zero");
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Appends as much of `data` as fits and returns the number of bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.remaining());
        self.data[self.cursor..self.cursor + accepted].copy_from_slice(&data[..accepted]);
        self.cursor += accepted;
        accepted
    }

    /// Number of staged bytes.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Space left before the buffer is full.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn has_pending_data(&self) -> bool {
        !self.is_empty()
    }

    /// The staged region.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Empties the buffer without touching its memory.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Drops the first `n` staged bytes and moves the rest to the front.
    ///
    /// Used after a short flush so the unflushed tail stays queued.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.cursor);
        if n == self.cursor {
            self.reset();
            return;
        }
        self.data.copy_within(n..self.cursor, 0);
        self.cursor -= n;
    }
}

impl Default for FixedWriteBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

impl AsRef<[u8]> for FixedWriteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
