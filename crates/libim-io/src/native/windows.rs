//! Handle-based file access for Windows targets.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::windows::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::StreamError;
use crate::native::{NativeFileHandle, OpenMode, closed_handle_error};

/// `FILE_SHARE_READ`: other openers may read while this handle is live.
const SHARE_MODE: u32 = 0x0000_0001;

/// `FILE_ATTRIBUTE_NORMAL`
const CREATE_ATTRIBUTES: u32 = 0x0000_0080;

/// An open `HANDLE` plus the mode and path it was opened with.
///
/// The handle is `None` once released.
#[derive(Debug)]
pub struct WindowsFileHandle {
    handle: Option<File>,
    mode: OpenMode,
    path: PathBuf,
}

impl WindowsFileHandle {
    fn file(&mut self) -> Result<&mut File, std::io::Error> {
        self.handle.as_mut().ok_or_else(closed_handle_error)
    }
}

impl NativeFileHandle for WindowsFileHandle {
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
        opts.share_mode(SHARE_MODE).attributes(CREATE_ATTRIBUTES);
        let handle = opts.open(path).map_err(open_err)?;

        // GetFileSizeEx
        let len = handle.metadata().map_err(open_err)?.len();

        Ok((
            Self {
                handle: Some(handle),
                mode,
                path: path.to_path_buf(),
            },
            len,
        ))
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let file = self.file().map_err(StreamError::read)?;
        file.read(buf).map_err(StreamError::read)
    }

    fn write_from(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let file = self.file().map_err(StreamError::write)?;
        file.write(buf).map_err(StreamError::write)
    }

    fn seek_absolute(&mut self, position: u64) -> Result<(), StreamError> {
        let seek_err = |source| StreamError::Seek { position, source };
        let file = self.file().map_err(seek_err)?;
        file.seek(SeekFrom::Start(position)).map_err(seek_err)?;
        Ok(())
    }

    fn sync_and_close(&mut self) -> Result<(), StreamError> {
        let Some(file) = self.handle.take() else {
            return Ok(());
        };
        if self.mode.can_write() {
            // FlushFileBuffers
            file.sync_all().map_err(StreamError::write)?;
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}
