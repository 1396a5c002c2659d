//! In-memory student surface.
//!
//! Clones share state, so a test can hand one clone to the controller and
//! keep another to inspect what was written or to close the "window" behind
//! the controller's back.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{SecondarySurface, SurfaceError};
use crate::core::document::StudentDocument;

#[derive(Debug, Default)]
struct RecordingState {
    open: bool,
    block_open: bool,
    open_count: usize,
    close_count: usize,
    current: Option<StudentDocument>,
    history: Vec<StudentDocument>,
}

/// Surface that records every document written to it
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose creation is refused, like a blocked popup
    pub fn blocked() -> Self {
        let surface = Self::default();
        surface.lock().block_open = true;
        surface
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Simulate the user closing the display
    pub fn close_externally(&self) {
        let mut state = self.lock();
        state.open = false;
        state.current = None;
    }

    /// Allow or refuse future `open` calls
    pub fn set_blocked(&self, blocked: bool) {
        self.lock().block_open = blocked;
    }

    /// Document currently on display
    pub fn current(&self) -> Option<StudentDocument> {
        self.lock().current.clone()
    }

    /// Every document written, oldest first
    pub fn history(&self) -> Vec<StudentDocument> {
        self.lock().history.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().history.len()
    }

    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }
}

impl SecondarySurface for RecordingSurface {
    fn name(&self) -> &str {
        "recording"
    }

    fn open(&mut self) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        if state.block_open {
            return Err(SurfaceError::Blocked("surface creation refused".to_string()));
        }
        state.open = true;
        state.open_count += 1;
        Ok(())
    }

    fn write(&mut self, document: &StudentDocument) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        if !state.open {
            return Err(SurfaceError::Closed);
        }
        state.current = Some(document.clone());
        state.history.push(document.clone());
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.lock();
        if state.open {
            state.open = false;
            state.current = None;
            state.close_count += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }
}
