//! Native file handles.
//!
//! The [`NativeFileHandle`] trait is the only seam between the channel and the
//! operating system. Exactly one implementation is compiled per target:
//!
//! - Unix: [`UnixFileHandle`], descriptor based (`open`/`read`/`write`/`lseek`/`fsync`)
//! - Windows: [`WindowsFileHandle`], handle based (`CreateFile`/`ReadFile`/`WriteFile`/
//!   `SetFilePointerEx`/`FlushFileBuffers`)
//!
//! [`PlatformFileHandle`] names whichever one the current target uses. No other
//! module in this crate contains platform-conditional code.

use std::fmt::Debug;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use crate::StreamError;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixFileHandle;
#[cfg(windows)]
pub use windows::WindowsFileHandle;

/// The native handle type for the current target.
#[cfg(unix)]
pub type PlatformFileHandle = UnixFileHandle;

/// The native handle type for the current target.
#[cfg(windows)]
pub type PlatformFileHandle = WindowsFileHandle;

#[cfg(not(any(unix, windows)))]
compile_error!("libim-io supports only unix and windows targets");

/// Access mode a file is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read an existing file.
    Read,
    /// Write only; the file is created if absent.
    Write,
    /// Read and write; the file is created if absent.
    ReadWrite,
}

impl OpenMode {
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    /// Whether an existing file is truncated when no explicit choice is made.
    pub fn truncates_by_default(self) -> bool {
        self.can_write()
    }

    /// Builds the portable part of the open options.
    ///
    /// `truncate_existing` is ignored for [`OpenMode::Read`].
    pub(crate) fn open_options(self, truncate_existing: bool) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self {
            Self::Read => {
                opts.read(true);
            }
            Self::Write => {
                opts.write(true).create(true).truncate(truncate_existing);
            }
            Self::ReadWrite => {
                opts.read(true)
                    .write(true)
                    .create(true)
                    .truncate(truncate_existing);
            }
        }
        opts
    }
}

/// Thin wrapper over one open OS file.
///
/// Each method issues at most one system call for the data path, so the
/// channel above can reason about how many OS writes a flush costs. A handle
/// is released exactly once; [`NativeFileHandle::sync_and_close`] is
/// idempotent.
pub trait NativeFileHandle: Debug + Sized {
    /// Opens `path` and returns the handle together with the file's current length.
    fn open(path: &Path, mode: OpenMode, truncate_existing: bool)
    -> Result<(Self, u64), StreamError>;

    /// One OS read of up to `buf.len()` bytes. A short read is not an error.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// One OS write of up to `buf.len()` bytes. A short write is not an error.
    fn write_from(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    /// Moves the OS cursor to `position` bytes from the start of the file.
    fn seek_absolute(&mut self, position: u64) -> Result<(), StreamError>;

    /// Syncs to stable storage (writable handles only) and releases the handle.
    fn sync_and_close(&mut self) -> Result<(), StreamError>;

    fn path(&self) -> &Path;

    fn mode(&self) -> OpenMode;

    fn is_open(&self) -> bool;
}

/// Error for operations on a handle that was already released.
pub(crate) fn closed_handle_error() -> io::Error {
    io::Error::other("native file handle is closed")
}
