//! Stream error types.
//!
//! Every OS-level failure keeps the originating [`std::io::Error`] as its
//! source. Its `Display` output is the platform's own diagnostic (`strerror`
//! text on Unix, `FormatMessage` text on Windows), so the message a caller
//! sees is the one the operating system produced.

use std::io;
use std::path::PathBuf;

/// Errors from a file stream or its underlying channel.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The native handle could not be opened or its size could not be probed.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS rejected a read.
    #[error("failed to read from file: {source}")]
    Read {
        #[source]
        source: io::Error,
    },

    /// The OS rejected a write, a sync, or a flush made no progress.
    #[error("failed to write data to file: {source}")]
    Write {
        #[source]
        source: io::Error,
    },

    /// The OS could not reposition the file cursor.
    #[error("failed to seek to position {position}: {source}")]
    Seek {
        position: u64,
        #[source]
        source: io::Error,
    },

    /// A write would take the logical offset to the configured ceiling.
    #[error("write of {requested} bytes at offset {offset} reaches max file size limit {limit}")]
    SizeLimitExceeded {
        offset: u64,
        requested: usize,
        limit: u64,
    },

    /// The channel was closed before this operation.
    #[error("{path} used after close")]
    UseAfterClose { path: PathBuf },
}

impl StreamError {
    pub(crate) fn read(source: io::Error) -> Self {
        Self::Read { source }
    }

    pub(crate) fn write(source: io::Error) -> Self {
        Self::Write { source }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::Open { source, .. }
            | StreamError::Read { source }
            | StreamError::Write { source }
            | StreamError::Seek { source, .. } => source.kind(),
            StreamError::SizeLimitExceeded { .. } => io::ErrorKind::FileTooLarge,
            StreamError::UseAfterClose { .. } => io::ErrorKind::BrokenPipe,
        };
        io::Error::new(kind, err)
    }
}
