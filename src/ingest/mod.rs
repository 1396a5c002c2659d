//! Lesson change ingestion.
//!
//! The presenter keeps showing a lesson while its file is edited. The
//! watcher turns file-system noise into one [`LessonChanged`] event per real
//! content change; the host then re-fetches and hands the new snapshot to
//! the controller.
//!
//! # Architecture
//!
//! ```text
//! lesson.yaml → Watcher → LessonChanged → fetch() → replace_content()
//! ```

pub mod watcher;

// Re-export key types
pub use watcher::{LessonChanged, LessonWatcher, WatchHandle, WatcherConfig, WatcherError};
