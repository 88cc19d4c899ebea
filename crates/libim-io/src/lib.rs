//! # libim-io: buffered cross-platform file streams
//!
//! This crate gives one seek/read/write/size/tell/close contract over the
//! divergent native file APIs of Unix and Windows, with a write buffer in
//! front of the OS and a logical size and cursor tracked independently of
//! the descriptor.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ FileStream / InputFileStream /             │
//! │ OutputFileStream                           │
//! │   (Stream, ReadStream, WriteStream)        │
//! └─────────────────────┬──────────────────────┘
//!                       │ Rc<RefCell<_>>
//! ┌─────────────────────┴──────────────────────┐
//! │ BufferedFileChannel                        │
//! │   file_size, current_offset, size cap      │
//! │  ┌──────────────────┐ ┌──────────────────┐ │
//! │  │ FixedWriteBuffer │ │ NativeFileHandle │ │
//! │  └──────────────────┘ └────────┬─────────┘ │
//! └────────────────────────────────┼───────────┘
//!                    ┌─────────────┴─────────────┐
//!             UnixFileHandle              WindowsFileHandle
//! ```
//!
//! Writes are staged and reach the OS when the buffer fills, before a seek
//! or read, and on close. Reads go straight to the handle, clamped to the
//! logical end of file.
//!
//! # Example
//!
//! ```no_run
//! use libim_io::{FileStream, OpenMode};
//!
//! # fn main() -> Result<(), libim_io::StreamError> {
//! let mut out = FileStream::open("level.bin", OpenMode::Write)?;
//! out.write(&[0xAA; 4096])?;
//! out.close()?;
//!
//! let mut input = FileStream::open("level.bin", OpenMode::Read)?;
//! let mut buf = vec![0u8; input.size() as usize];
//! input.read(&mut buf)?;
//! # Ok(())
//! # }
//! ```

mod buffer;
mod channel;
mod config;
mod error;
mod native;
mod stream;

pub use buffer::{DEFAULT_BUFFER_CAPACITY, FixedWriteBuffer};
pub use channel::BufferedFileChannel;
pub use config::{ChannelConfig, DEFAULT_MAX_FILE_SIZE};
pub use error::StreamError;
pub use native::{NativeFileHandle, OpenMode, PlatformFileHandle};
#[cfg(unix)]
pub use native::UnixFileHandle;
#[cfg(windows)]
pub use native::WindowsFileHandle;
pub use stream::{
    FileStream, FileStreamOptions, InputFileStream, OutputFileStream, ReadStream, Stream,
    WriteStream,
};

#[cfg(test)]
mod mock;
