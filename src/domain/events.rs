//! Presentation events.
//!
//! Every transition of the presentation controller is recorded as an
//! immutable event in an in-memory log. The log lives only as long as the
//! controller; it is never written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in the presentation log.
///
/// The controller's state can be reconstructed by replaying its events
/// in order (see [`super::PresentationState::from_events`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// Presentation session this event belongs to
    pub session_id: Uuid,

    /// Type of event
    pub event_type: PresentationEventType,

    /// Activity index committed at the time of the event
    pub activity_index: usize,

    /// Human-readable summary
    pub summary: String,

    /// Fingerprint of the pushed document (push events only)
    pub document_fingerprint: Option<String>,

    /// Resource involved (embed lifecycle events only)
    pub resource_id: Option<String>,

    /// Error message if something went wrong
    pub error: Option<String>,
}

impl PresentationEvent {
    /// Create a new event with the current timestamp
    pub fn new(
        session_id: Uuid,
        event_type: PresentationEventType,
        activity_index: usize,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            session_id,
            event_type,
            activity_index,
            summary: summary.into(),
            document_fingerprint: None,
            resource_id: None,
            error: None,
        }
    }

    /// Attach the fingerprint of a pushed document
    pub fn with_fingerprint(mut self, fingerprint: String) -> Self {
        self.document_fingerprint = Some(fingerprint);
        self
    }

    /// Attach the resource an embed event refers to
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Attach error information
    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Types of events the controller records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationEventType {
    /// The student surface was created
    SurfaceOpened,

    /// The student surface could not be created
    SurfaceUnavailable,

    /// The surface was closed by the controller
    SurfaceClosed,

    /// The surface was found dead before a push
    SurfaceLost,

    /// A new activity index was committed
    IndexCommitted,

    /// Fresh lesson content replaced the old snapshot
    ContentReplaced,

    /// A complete document was written to the surface
    DocumentPushed,

    /// An embed finished loading
    EmbedLoaded,

    /// An embed failed to load
    EmbedFailed,
}
