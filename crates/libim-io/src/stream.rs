//! File streams and capability traits.
//!
//! [`FileStream`] is the public face of a [`BufferedFileChannel`]. Clones of a
//! stream alias the same channel; the channel is closed when the last alias
//! drops or when any alias calls [`Stream::close`], after which I/O through
//! every alias fails with [`StreamError::UseAfterClose`].
//!
//! Capabilities are split across three traits instead of one wide interface:
//!
//! | Type               | `Stream` | `ReadStream` | `WriteStream` |
//! |--------------------|----------|--------------|---------------|
//! | `FileStream`       | yes      | yes          | yes           |
//! | `InputFileStream`  | yes      | yes          | no            |
//! | `OutputFileStream` | yes      | no           | yes           |
//!
//! Streams are single-threaded (`!Send`); share them across threads only
//! behind external synchronization of your own.

use std::cell::RefCell;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bytes::{Bytes, BytesMut};

use crate::StreamError;
use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::channel::BufferedFileChannel;
use crate::config::ChannelConfig;
use crate::native::OpenMode;

/// Operations every stream supports regardless of direction.
pub trait Stream {
    /// Display name, for diagnostics only.
    fn name(&self) -> &str;

    fn seek(&mut self, position: u64) -> Result<(), StreamError>;

    fn size(&self) -> u64;

    fn tell(&self) -> u64;

    fn can_read(&self) -> bool;

    fn can_write(&self) -> bool;

    fn close(&mut self) -> Result<(), StreamError>;
}

/// The read half of the stream contract.
pub trait ReadStream: Stream {
    /// Reads up to `buf.len()` bytes. Returns 0 at end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Reads everything between [`Stream::tell`] and [`Stream::size`].
    ///
    /// Stops early if the OS reports end of data before the logical size,
    /// which happens when the tail is a gap created by seeking past the end.
    /// Memory grows with the bytes actually read, not with the logical size.
    fn read_remaining(&mut self) -> Result<Bytes, StreamError> {
        let mut out = BytesMut::new();
        let mut chunk = [0u8; DEFAULT_BUFFER_CAPACITY];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out.freeze())
    }
}

/// The write half of the stream contract.
pub trait WriteStream: Stream {
    /// Writes `data` at the current position. A short count means a flush
    /// made partial progress.
    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError>;

    /// Hands buffered bytes to the OS in one call.
    fn flush(&mut self) -> Result<usize, StreamError>;
}

/// How to open a [`FileStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStreamOptions {
    mode: OpenMode,
    truncate_existing: Option<bool>,
    config: ChannelConfig,
}

impl FileStreamOptions {
    pub fn new(mode: OpenMode) -> Self {
        Self {
            mode,
            truncate_existing: None,
            config: ChannelConfig::default(),
        }
    }

    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the mode default (truncate for `Write`/`ReadWrite`).
    /// Ignored for `Read`.
    pub fn with_truncate_existing(mut self, truncate: bool) -> Self {
        self.truncate_existing = Some(truncate);
        self
    }

    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<FileStream, StreamError> {
        let path = path.as_ref();
        let truncate = self
            .truncate_existing
            .unwrap_or_else(|| self.mode.truncates_by_default());
        let channel = BufferedFileChannel::open(path, self.mode, truncate, &self.config)?;
        Ok(FileStream::from_channel(channel))
    }
}

/// A buffered, seekable file stream.
#[derive(Debug, Clone)]
pub struct FileStream {
    channel: Rc<RefCell<BufferedFileChannel>>,
    name: String,
}

impl FileStream {
    /// Opens `path` with the default truncation behaviour for `mode`.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self, StreamError> {
        FileStreamOptions::new(mode).open(path)
    }

    /// Wraps an open channel.
    pub fn from_channel(channel: BufferedFileChannel) -> Self {
        let name = display_name(channel.path());
        Self {
            channel: Rc::new(RefCell::new(channel)),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> PathBuf {
        self.channel.borrow().path().to_path_buf()
    }

    pub fn mode(&self) -> OpenMode {
        self.channel.borrow().mode()
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.channel.borrow_mut().read(buf)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        self.channel.borrow_mut().write(data)
    }

    pub fn flush(&mut self) -> Result<usize, StreamError> {
        self.channel.borrow_mut().flush()
    }

    pub fn seek(&mut self, position: u64) -> Result<(), StreamError> {
        self.channel.borrow_mut().seek(position)
    }

    pub fn size(&self) -> u64 {
        self.channel.borrow().size()
    }

    pub fn tell(&self) -> u64 {
        self.channel.borrow().tell()
    }

    pub fn can_read(&self) -> bool {
        self.channel.borrow().can_read()
    }

    pub fn can_write(&self) -> bool {
        self.channel.borrow().can_write()
    }

    /// Closes the shared channel for every alias.
    pub fn close(&mut self) -> Result<(), StreamError> {
        self.channel.borrow_mut().close()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.borrow().is_closed()
    }

    /// Number of live aliases of the underlying channel.
    pub fn alias_count(&self) -> usize {
        Rc::strong_count(&self.channel)
    }

    fn file(&self) -> &FileStream {
        self
    }

    fn file_mut(&mut self) -> &mut FileStream {
        self
    }
}

/// A stream opened in [`OpenMode::Read`] that exposes only the read half.
#[derive(Debug, Clone)]
pub struct InputFileStream {
    inner: FileStream,
}

impl InputFileStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        Self::open_with_config(path, ChannelConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: ChannelConfig,
    ) -> Result<Self, StreamError> {
        let inner = FileStreamOptions::new(OpenMode::Read)
            .with_config(config)
            .open(path)?;
        Ok(Self { inner })
    }

    fn file(&self) -> &FileStream {
        &self.inner
    }

    fn file_mut(&mut self) -> &mut FileStream {
        &mut self.inner
    }
}

/// A stream opened in [`OpenMode::Write`] that exposes only the write half.
#[derive(Debug, Clone)]
pub struct OutputFileStream {
    inner: FileStream,
}

impl OutputFileStream {
    /// Creates or truncates `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        Self::open_with(path, true, ChannelConfig::default())
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        truncate_existing: bool,
        config: ChannelConfig,
    ) -> Result<Self, StreamError> {
        let inner = FileStreamOptions::new(OpenMode::Write)
            .with_truncate_existing(truncate_existing)
            .with_config(config)
            .open(path)?;
        Ok(Self { inner })
    }

    fn file(&self) -> &FileStream {
        &self.inner
    }

    fn file_mut(&mut self) -> &mut FileStream {
        &mut self.inner
    }
}

/// Implements [`Stream`] and [`io::Seek`] on top of the type's `file()` accessors.
macro_rules! forward_stream {
    ($ty:ty) => {
        impl Stream for $ty {
            fn name(&self) -> &str {
                self.file().name()
            }

            fn seek(&mut self, position: u64) -> Result<(), StreamError> {
                self.file_mut().seek(position)
            }

            fn size(&self) -> u64 {
                self.file().size()
            }

            fn tell(&self) -> u64 {
                self.file().tell()
            }

            fn can_read(&self) -> bool {
                self.file().can_read()
            }

            fn can_write(&self) -> bool {
                self.file().can_write()
            }

            fn close(&mut self) -> Result<(), StreamError> {
                self.file_mut().close()
            }
        }

        impl io::Seek for $ty {
            fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
                let target = resolve_seek(self.file().tell(), self.file().size(), pos)?;
                self.file_mut().seek(target)?;
                Ok(target)
            }
        }
    };
}

forward_stream!(FileStream);
forward_stream!(InputFileStream);
forward_stream!(OutputFileStream);

impl ReadStream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        FileStream::read(self, buf)
    }
}

impl ReadStream for InputFileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.inner.read(buf)
    }
}

impl WriteStream for FileStream {
    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        FileStream::write(self, data)
    }

    fn flush(&mut self) -> Result<usize, StreamError> {
        FileStream::flush(self)
    }
}

impl WriteStream for OutputFileStream {
    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        self.inner.write(data)
    }

    fn flush(&mut self) -> Result<usize, StreamError> {
        self.inner.flush()
    }
}

impl io::Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(FileStream::read(self, buf)?)
    }
}

impl io::Read for InputFileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.inner.read(buf)?)
    }
}

impl io::Write for FileStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(FileStream::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.channel.borrow_mut().flush_all()?)
    }
}

impl io::Write for OutputFileStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.inner.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut self.inner)
    }
}

/// Name shown in diagnostics: the final path component, or the whole path.
fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Turns a relative [`SeekFrom`] into an absolute position.
fn resolve_seek(tell: u64, size: u64, pos: SeekFrom) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(p) => Some(p),
        SeekFrom::Current(delta) => tell.checked_add_signed(delta),
        SeekFrom::End(delta) => size.checked_add_signed(delta),
    };
    target.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid seek to a negative or overflowing position",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/dir/level.cnd")), "level.cnd");
        assert_eq!(display_name(Path::new("/")), "/");
    }

    #[test]
    fn resolve_seek_variants() {
        assert_eq!(resolve_seek(5, 10, SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(resolve_seek(5, 10, SeekFrom::Current(2)).unwrap(), 7);
        assert_eq!(resolve_seek(5, 10, SeekFrom::Current(-5)).unwrap(), 0);
        assert_eq!(resolve_seek(5, 10, SeekFrom::End(-1)).unwrap(), 9);
        assert_eq!(resolve_seek(5, 10, SeekFrom::End(4)).unwrap(), 14);
    }

    #[test]
    fn resolve_seek_rejects_negative_target() {
        let err = resolve_seek(5, 10, SeekFrom::Current(-6)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn options_default_truncation_follows_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.bin");
        std::fs::write(&path, b"existing").unwrap();

        let stream = FileStreamOptions::new(OpenMode::Write)
            .with_truncate_existing(false)
            .open(&path)
            .unwrap();
        assert_eq!(stream.size(), 8);
        assert_eq!(stream.tell(), 0);
        drop(stream);

        let stream = FileStream::open(&path, OpenMode::Write).unwrap();
        assert_eq!(stream.size(), 0);
    }
}
