//! Domain types for classcast.
//!
//! This module contains the core data structures:
//! - Lesson: Activities and resources delivered by the data layer
//! - Events: Immutable records of presentation transitions
//! - State: Navigation and surface state

pub mod events;
pub mod lesson;
pub mod state;

// Re-export commonly used types
pub use events::{PresentationEvent, PresentationEventType};
pub use lesson::{Activity, LessonContent, Resource, ResourceParent};
pub use state::{PresentationState, SurfaceStatus};
