//! Lesson data layer seam.
//!
//! Lessons arrive as complete snapshots from a [`LessonSource`]. The crate
//! ships a file-backed source for YAML/JSON lesson files and an in-memory
//! source for tests and embedding.
//!
//! # Lesson File Layout
//!
//! ```text
//! id: lesson-1
//! title: Fractions
//! activities:
//!   - id: warm-up
//!     title: Warm-up
//!     student_content: "<p>...</p>"
//!     show_to_students: true
//!     order_index: 1
//! resources:
//!   - id: pizza
//!     title: Pizza slices
//!     file_url: https://example.com/pizza.png
//!     visible_to_students: true
//!     parent:
//!       activity: warm-up
//! ```

pub mod source;

pub use source::{
    parse_lesson, FileLessonSource, LessonError, LessonFormat, LessonSource, MemoryLessonSource,
};
