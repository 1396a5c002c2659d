//! Adapter interfaces for host-side display and link handling.
//!
//! The presentation controller never talks to a window, a browser, or the
//! filesystem directly. It goes through two seams:
//!
//! - [`SecondarySurface`]: the student-facing display the controller owns
//! - [`ExternalOpener`]: hands a URL to something outside the display

pub mod file_surface;
pub mod opener;
pub mod recording;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::document::StudentDocument;

pub use file_surface::FileSurface;
pub use opener::{OpenerError, RecordingOpener, SystemOpener};
pub use recording::RecordingSurface;

/// Errors raised by a secondary surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The host refused to create the surface (e.g. a popup blocker)
    #[error("Surface could not be created: {0}")]
    Blocked(String),

    /// The surface is not open
    #[error("Surface is closed")]
    Closed,

    /// The document could not be moved into place
    #[error("Failed to replace surface document at {path}: {message}")]
    Persist { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A display context that shows one complete student document at a time.
///
/// Implementations must replace the previous document entirely on every
/// `write`; a surface never shows a mix of two documents.
pub trait SecondarySurface {
    /// Human-readable surface name
    fn name(&self) -> &str;

    /// Create (or re-acquire) the display context
    fn open(&mut self) -> Result<(), SurfaceError>;

    /// Replace the displayed document
    fn write(&mut self, document: &StudentDocument) -> Result<(), SurfaceError>;

    /// Release the display context. Closing a closed surface is a no-op.
    fn close(&mut self);

    /// Whether the display context still exists.
    ///
    /// This may turn false without `close` being called, e.g. when a user
    /// closes the window.
    fn is_open(&self) -> bool;
}

/// Opens a URL outside the student display (new tab, system viewer).
///
/// Must not block the caller on the opened application.
pub trait ExternalOpener: Send + Sync {
    fn open_url(&self, url: &str) -> Result<(), OpenerError>;
}
