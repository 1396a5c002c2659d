//! Presentation state and reconstruction from events.

use serde::{Deserialize, Serialize};

use super::events::{PresentationEvent, PresentationEventType};

/// Navigation and surface state owned by the presentation controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationState {
    /// Index of the activity currently selected on the teacher view
    pub current_activity_index: usize,

    /// Whether the student surface is believed to be open
    pub surface_open: bool,
}

impl PresentationState {
    /// Fresh state: first activity, surface closed
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct state from a sequence of events
    pub fn from_events(events: &[PresentationEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let mut state = Self::new();
        for event in events {
            state.apply_event(event);
        }

        Some(state)
    }

    /// Apply a single event
    pub fn apply_event(&mut self, event: &PresentationEvent) {
        match event.event_type {
            PresentationEventType::SurfaceOpened => {
                self.surface_open = true;
            }
            PresentationEventType::SurfaceClosed
            | PresentationEventType::SurfaceLost
            | PresentationEventType::SurfaceUnavailable => {
                self.surface_open = false;
            }
            PresentationEventType::IndexCommitted | PresentationEventType::ContentReplaced => {
                self.current_activity_index = event.activity_index;
            }
            PresentationEventType::DocumentPushed
            | PresentationEventType::EmbedLoaded
            | PresentationEventType::EmbedFailed => {}
        }
    }

    /// Surface status as a state-machine value
    pub fn status(&self) -> SurfaceStatus {
        if self.surface_open {
            SurfaceStatus::Open {
                activity_index: self.current_activity_index,
            }
        } else {
            SurfaceStatus::Closed
        }
    }
}

/// The controller's two states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SurfaceStatus {
    /// No student surface exists
    Closed,

    /// The student surface shows the given activity
    Open { activity_index: usize },
}

impl Default for SurfaceStatus {
    fn default() -> Self {
        Self::Closed
    }
}
