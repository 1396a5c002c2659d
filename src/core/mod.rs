//! Core classification, sanitizing, rendering and sync logic.
//!
//! This module contains:
//! - Classify: URL to resource type
//! - Sanitize: Allow-list markup cleaning
//! - Render: Per-resource view models and embed load state
//! - Document: Student document generation
//! - Present: The presentation sync controller

pub mod classify;
pub mod document;
pub mod present;
pub mod render;
pub mod sanitize;

// Re-export commonly used types
pub use classify::{
    classify, extract_youtube_id, google_docs_preview_url, to_google_docs_preview_url,
    ResourceType,
};
pub use document::{build_document, Instructions, ResourceBlock, StudentDocument};
pub use present::{Direction, FocusContext, Key, KeyboardScope, PresentationController};
pub use render::{render, EmbedRegistry, EmbedState, EmbedView, FallbackReason, ViewModel};
pub use sanitize::{sanitize, SanitizeOptions};
