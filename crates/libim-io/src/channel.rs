//! Buffered file channel.
//!
//! A [`BufferedFileChannel`] owns one native handle and one
//! [`FixedWriteBuffer`], and keeps the logical view of the file that callers
//! see:
//!
//! - `file_size`: the logical end of file, the highest offset ever made valid
//!   by a write or a seek
//! - `current_offset`: the logical cursor, which runs ahead of the OS cursor
//!   while bytes sit in the write buffer
//!
//! # Invariants
//!
//! - `current_offset <= file_size` after every completed operation
//! - Staged bytes are always destined for the offsets just below
//!   `current_offset`; the buffer is drained before the OS cursor moves
//! - `file_size < max_file_size` for anything this channel grows: neither a
//!   write nor a seek may reach the cap
//! - After [`BufferedFileChannel::close`] every I/O operation fails with
//!   [`StreamError::UseAfterClose`]

use std::io;
use std::path::Path;

use crate::StreamError;
use crate::buffer::FixedWriteBuffer;
use crate::config::ChannelConfig;
use crate::native::{NativeFileHandle, OpenMode, PlatformFileHandle};

/// A native handle with a write buffer and logical size/offset tracking.
///
/// Reads are unbuffered. Writes are staged and handed to the OS when the
/// buffer fills, before a seek or read, and on close.
#[derive(Debug)]
pub struct BufferedFileChannel<H: NativeFileHandle = PlatformFileHandle> {
    handle: H,
    buffer: FixedWriteBuffer,
    mode: OpenMode,
    file_size: u64,
    current_offset: u64,
    max_file_size: u64,
    closed: bool,
}

impl<H: NativeFileHandle> BufferedFileChannel<H> {
    /// Opens `path` and probes its size.
    pub fn open(
        path: &Path,
        mode: OpenMode,
        truncate_existing: bool,
        config: &ChannelConfig,
    ) -> Result<Self, StreamError> {
        let (handle, file_size) = H::open(path, mode, truncate_existing)?;
        tracing::debug!(
            path = %path.display(),
            ?mode,
            truncate_existing,
            file_size,
            "opened file channel"
        );
        Ok(Self::from_handle(handle, file_size, config))
    }

    /// Wraps an already-open handle whose current length is `file_size`.
    pub fn from_handle(handle: H, file_size: u64, config: &ChannelConfig) -> Self {
        Self {
            mode: handle.mode(),
            handle,
            buffer: FixedWriteBuffer::with_capacity(config.buffer_capacity),
            file_size,
            current_offset: 0,
            max_file_size: config.max_file_size,
            closed: false,
        }
    }

    /// Stages `data` for writing at the current offset.
    ///
    /// Returns the number of bytes accepted. The count is short only when a
    /// flush made partial progress; the unflushed bytes stay staged and the
    /// caller decides whether to retry the remainder.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.mode.can_write() {
            return Err(StreamError::write(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "channel is not open for writing",
            )));
        }
        if data.is_empty() {
            return Ok(0);
        }

        let end = self.current_offset.saturating_add(data.len() as u64);
        if end >= self.max_file_size {
            return Err(StreamError::SizeLimitExceeded {
                offset: self.current_offset,
                requested: data.len(),
                limit: self.max_file_size,
            });
        }

        let mut accepted = 0;
        let outcome = loop {
            accepted += self.buffer.write(&data[accepted..]);
            if accepted == data.len() {
                break Ok(());
            }

            let staged = self.buffer.len();
            match self.flush_staged() {
                Err(e) => break Err(e),
                Ok(flushed) if flushed < staged => {
                    tracing::warn!(
                        path = %self.handle.path().display(),
                        staged,
                        flushed,
                        accepted,
                        requested = data.len(),
                        "short flush, write returns partial count"
                    );
                    break Ok(());
                }
                Ok(_) => {}
            }
        };

        // Accepted bytes are staged or on disk either way.
        self.advance(accepted as u64);
        outcome.map(|()| accepted)
    }

    /// Hands staged bytes to the OS in one write call.
    ///
    /// Returns the number of bytes the OS took; 0 if nothing was staged or the
    /// channel is read-only.
    pub fn flush(&mut self) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.mode.can_write() || !self.buffer.has_pending_data() {
            return Ok(0);
        }
        self.flush_staged()
    }

    /// Flushes until nothing is staged.
    pub fn flush_all(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.drain()
    }

    /// Reads into `buf` from the current offset, never past the logical end of file.
    ///
    /// Returns 0 at or beyond the end of file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.mode.can_read() {
            return Err(StreamError::read(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "channel is not open for reading",
            )));
        }
        // The OS cursor must catch up with the logical one first.
        self.drain()?;

        let remaining = self.file_size.saturating_sub(self.current_offset);
        let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        if len == 0 {
            return Ok(0);
        }

        let n = self.handle.read_into(&mut buf[..len])?;
        self.current_offset += n as u64;
        Ok(n)
    }

    /// Moves the logical and OS cursors to `position`.
    ///
    /// Seeking past the end of file extends the logical size immediately.
    /// A position at or beyond the size cap is rejected before anything moves.
    pub fn seek(&mut self, position: u64) -> Result<(), StreamError> {
        self.ensure_open()?;
        if position >= self.max_file_size {
            return Err(StreamError::SizeLimitExceeded {
                offset: position,
                requested: 0,
                limit: self.max_file_size,
            });
        }
        self.drain()?;
        self.handle.seek_absolute(position)?;
        self.current_offset = position;
        if position > self.file_size {
            self.file_size = position;
        }
        Ok(())
    }

    /// Drains the buffer, syncs, and releases the handle. Idempotent.
    ///
    /// The channel counts as closed even when draining fails; the first
    /// failure is returned.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let drained = self.drain();
        let released = self.handle.sync_and_close();
        tracing::debug!(
            path = %self.handle.path().display(),
            file_size = self.file_size,
            "closed file channel"
        );
        drained.and(released)
    }

    /// Logical size in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// Logical cursor position.
    pub fn tell(&self) -> u64 {
        self.current_offset
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn can_read(&self) -> bool {
        self.mode.can_read()
    }

    pub fn can_write(&self) -> bool {
        self.mode.can_write()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    /// Bytes staged but not yet handed to the OS.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    #[cfg(test)]
    pub(crate) fn handle(&self) -> &H {
        &self.handle
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::UseAfterClose {
                path: self.handle.path().to_path_buf(),
            });
        }
        Ok(())
    }

    fn advance(&mut self, n: u64) {
        self.current_offset += n;
        if self.current_offset > self.file_size {
            self.file_size = self.current_offset;
        }
    }

    /// One OS write of the staged region; keeps whatever the OS did not take.
    fn flush_staged(&mut self) -> Result<usize, StreamError> {
        let staged = self.buffer.len();
        let flushed = self.handle.write_from(self.buffer.as_slice())?;
        self.buffer.consume(flushed);
        tracing::trace!(staged, flushed, "flushed write buffer");
        Ok(flushed)
    }

    fn drain(&mut self) -> Result<(), StreamError> {
        while self.buffer.has_pending_data() {
            if self.flush_staged()? == 0 {
                return Err(StreamError::write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("{} staged bytes could not be flushed", self.buffer.len()),
                )));
            }
        }
        Ok(())
    }
}

impl<H: NativeFileHandle> Drop for BufferedFileChannel<H> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(
                path = %self.handle.path().display(),
                error = %e,
                "failed to close file channel during drop"
            );
        }
    }
}
