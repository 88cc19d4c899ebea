//! Descriptor-based handle for Unix targets.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::StreamError;
use crate::native::{NativeFileHandle, OpenMode, closed_handle_error};

/// Permission bits for files this handle creates (owner read/write).
const CREATE_MODE: u32 = 0o600;

/// An open file descriptor plus the mode and path it was opened with.
///
/// The descriptor is `None` once released.
#[derive(Debug)]
pub struct UnixFileHandle {
    fd: Option<File>,
    mode: OpenMode,
    path: PathBuf,
}

impl UnixFileHandle {
    fn fd(&mut self) -> Result<&mut File, std::io::Error> {
        self.fd.as_mut().ok_or_else(closed_handle_error)
    }
}

impl NativeFileHandle for UnixFileHandle {
    fn open(
        path: &Path,
        mode: OpenMode,
        truncate_existing: bool,
    ) -> Result<(Self, u64), StreamError> {
        let open_err = |source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut opts = mode.open_options(truncate_existing);
        opts.mode(CREATE_MODE);
        let fd = opts.open(path).map_err(open_err)?;

        // fstat on the fresh descriptor
        let len = fd.metadata().map_err(open_err)?.len();

        Ok((
            Self {
                fd: Some(fd),
                mode,
                path: path.to_path_buf(),
            },
            len,
        ))
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let fd = self.fd().map_err(StreamError::read)?;
        fd.read(buf).map_err(StreamError::read)
    }

    fn write_from(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let fd = self.fd().map_err(StreamError::write)?;
        fd.write(buf).map_err(StreamError::write)
    }

    fn seek_absolute(&mut self, position: u64) -> Result<(), StreamError> {
        let seek_err = |source| StreamError::Seek { position, source };
        let fd = self.fd().map_err(seek_err)?;
        fd.seek(SeekFrom::Start(position)).map_err(seek_err)?;
        Ok(())
    }

    fn sync_and_close(&mut self) -> Result<(), StreamError> {
        let Some(fd) = self.fd.take() else {
            return Ok(());
        };
        if self.mode.can_write() {
            fd.sync_all().map_err(StreamError::write)?;
        }
        // close(2) happens when `fd` drops
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn is_open(&self) -> bool {
        self.fd.is_some()
    }
}
