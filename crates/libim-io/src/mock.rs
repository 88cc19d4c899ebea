//! In-memory `NativeFileHandle` for tests.
//!
//! Counts OS-level calls and can inject short or failing writes, so channel
//! behaviour can be checked without touching the filesystem.

use std::cell::{Ref, RefCell, RefMut};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::StreamError;
use crate::native::{NativeFileHandle, OpenMode, closed_handle_error};

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub data: Vec<u8>,
    pub cursor: usize,
    pub write_calls: usize,
    pub read_calls: usize,
    pub sync_calls: usize,
    pub close_calls: usize,
    /// Caps the bytes taken by each write call.
    pub max_write: Option<usize>,
    pub fail_writes: bool,
    pub fail_seeks: bool,
}

#[derive(Debug)]
pub(crate) struct MemoryFileHandle {
    state: Rc<RefCell<MockState>>,
    mode: OpenMode,
    path: PathBuf,
    open: bool,
}

impl MemoryFileHandle {
    pub fn new(mode: OpenMode) -> (Self, Rc<RefCell<MockState>>) {
        Self::with_contents(mode, Vec::new())
    }

    pub fn with_contents(mode: OpenMode, data: Vec<u8>) -> (Self, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState {
            data,
            ..MockState::default()
        }));
        let handle = Self {
            state: Rc::clone(&state),
            mode,
            path: PathBuf::from("memory.bin"),
            open: true,
        };
        (handle, state)
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    fn check_open(&self) -> Result<(), io::Error> {
        if self.open {
            Ok(())
        } else {
            Err(closed_handle_error())
        }
    }
}

impl NativeFileHandle for MemoryFileHandle {
    fn open(
        path: &Path,
        mode: OpenMode,
        _truncate_existing: bool,
    ) -> Result<(Self, u64), StreamError> {
        let (mut handle, _) = Self::new(mode);
        handle.path = path.to_path_buf();
        Ok((handle, 0))
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.check_open().map_err(StreamError::read)?;
        let mut state = self.state.borrow_mut();
        state.read_calls += 1;
        let start = state.cursor.min(state.data.len());
        let n = buf.len().min(state.data.len() - start);
        buf[..n].copy_from_slice(&state.data[start..start + n]);
        state.cursor += n;
        Ok(n)
    }

    fn write_from(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.check_open().map_err(StreamError::write)?;
        let mut state = self.state.borrow_mut();
        state.write_calls += 1;
        if state.fail_writes {
            return Err(StreamError::write(io::Error::other("injected write failure")));
        }

        let n = buf.len().min(state.max_write.unwrap_or(usize::MAX));
        let start = state.cursor;
        if state.data.len() < start + n {
            state.data.resize(start + n, 0);
        }
        state.data[start..start + n].copy_from_slice(&buf[..n]);
        state.cursor += n;
        Ok(n)
    }

    fn seek_absolute(&mut self, position: u64) -> Result<(), StreamError> {
        let seek_err = |source| StreamError::Seek { position, source };
        self.check_open().map_err(seek_err)?;
        let mut state = self.state.borrow_mut();
        if state.fail_seeks {
            return Err(seek_err(io::Error::from(io::ErrorKind::InvalidInput)));
        }
        state.cursor = position as usize;
        Ok(())
    }

    fn sync_and_close(&mut self) -> Result<(), StreamError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let mut state = self.state.borrow_mut();
        if self.mode.can_write() {
            state.sync_calls += 1;
        }
        state.close_calls += 1;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
