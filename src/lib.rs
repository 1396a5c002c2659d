//! classcast - Lesson resource classification and student display sync
//!
//! Decides how each lesson resource should be embedded, cleans rich-text
//! markup before it reaches a display, and keeps a student-facing display in
//! step with the teacher's navigation.
//!
//! # Architecture
//!
//! Data flows one way:
//! - Lesson snapshots come from a `LessonSource`
//! - Resources are classified from their URLs and rendered per type
//! - Student content and rendered resources pass through the sanitizer
//! - The controller rebuilds the whole student document on every change
//!   and replaces the surface contents with it
//!
//! # Modules
//!
//! - `adapters`: Student surfaces and external URL openers
//! - `core`: Classification, sanitizing, rendering, presentation control
//! - `domain`: Data structures (Lesson, PresentationEvent, PresentationState)
//! - `ingest`: Lesson file watching
//! - `library`: Lesson sources
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Classify a few URLs
//! classcast classify https://youtu.be/dQw4w9WgXcQ https://x.org/notes.pdf
//!
//! # Present a lesson; the student display is an HTML file
//! classcast present lessons/fractions.yaml --output /tmp/student.html
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{
    ExternalOpener, FileSurface, RecordingOpener, RecordingSurface, SecondarySurface,
    SurfaceError, SystemOpener,
};
pub use crate::core::{
    classify, extract_youtube_id, render, sanitize, to_google_docs_preview_url, Direction,
    PresentationController, ResourceType, SanitizeOptions, StudentDocument, ViewModel,
};
pub use domain::{
    Activity, LessonContent, PresentationEvent, PresentationEventType, PresentationState,
    Resource, SurfaceStatus,
};
pub use library::{FileLessonSource, LessonError, LessonSource};
