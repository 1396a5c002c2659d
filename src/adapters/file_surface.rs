//! File-backed student surface.
//!
//! The student display is an HTML file that a browser (or a kiosk with
//! auto-reload) shows. Every write goes to a temp file in the same directory
//! and is renamed over the target, so a reader never sees a half-written
//! document. Deleting the file from outside counts as closing the surface.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{SecondarySurface, SurfaceError};
use crate::core::document::StudentDocument;

const WAITING_PAGE: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\">\
<title>Student View</title></head>\n<body><p>Waiting for the lesson to start...</p></body>\n</html>\n";

/// Student surface backed by an HTML file
#[derive(Debug)]
pub struct FileSurface {
    path: PathBuf,
    opened: bool,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            opened: false,
        }
    }

    /// Path of the displayed document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replace_contents(&self, html: &str) -> Result<(), SurfaceError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(html.as_bytes())?;
        tmp.flush()?;

        tmp.persist(&self.path).map_err(|e| SurfaceError::Persist {
            path: self.path.clone(),
            message: e.error.to_string(),
        })?;

        Ok(())
    }
}

impl SecondarySurface for FileSurface {
    fn name(&self) -> &str {
        "file"
    }

    fn open(&mut self) -> Result<(), SurfaceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SurfaceError::Blocked(format!("{}: {}", parent.display(), e)))?;
            }
        }

        self.replace_contents(WAITING_PAGE)?;
        self.opened = true;

        info!(path = %self.path.display(), "Student surface opened");
        Ok(())
    }

    fn write(&mut self, document: &StudentDocument) -> Result<(), SurfaceError> {
        if !self.is_open() {
            return Err(SurfaceError::Closed);
        }

        self.replace_contents(&document.to_html())?;
        debug!(
            path = %self.path.display(),
            activity = document.activity_index,
            "Student document written"
        );
        Ok(())
    }

    fn close(&mut self) {
        if !self.opened {
            return;
        }
        self.opened = false;

        match std::fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Student surface closed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove student document"),
        }
    }

    fn is_open(&self) -> bool {
        self.opened && self.path.is_file()
    }
}
