//! Presentation sync controller.
//!
//! Owns the student surface and the navigation state. Every transition that
//! can change what students see (open, navigate, new content, an embed
//! failing) rebuilds the whole [`StudentDocument`] and replaces the surface
//! contents with it. Nothing is patched in place.
//!
//! Ordering: a new activity index is committed (and logged) before the
//! document for that index is built and pushed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{ExternalOpener, SecondarySurface};
use crate::domain::{
    Activity, LessonContent, PresentationEvent, PresentationEventType, PresentationState,
    SurfaceStatus,
};
use crate::library::{LessonError, LessonSource};

use super::document::StudentDocument;
use super::render::{open_externally, EmbedRegistry};
use super::sanitize::SanitizeOptions;

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Where keyboard focus is when a key arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusContext {
    #[default]
    Page,

    /// A text input or editable area has focus
    TextInput,
}

/// When arrow keys navigate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardScope {
    /// Arrow keys always navigate
    Global,

    /// Arrow keys are left alone while the user is typing
    #[default]
    WhenNotEditing,
}

/// Synchronizes a student surface with the teacher's navigation
pub struct PresentationController<S: SecondarySurface> {
    session_id: Uuid,
    content: LessonContent,
    state: PresentationState,
    surface: S,
    embeds: EmbedRegistry,
    options: SanitizeOptions,
    keyboard_scope: KeyboardScope,
    events: Vec<PresentationEvent>,
}

impl<S: SecondarySurface> PresentationController<S> {
    /// Enter presentation mode for a lesson. The surface starts closed.
    pub fn new(content: LessonContent, surface: S) -> Self {
        let mut content = content;
        content.sort();

        let mut embeds = EmbedRegistry::new();
        embeds.sync_all(&content.resources);

        Self {
            session_id: Uuid::new_v4(),
            content,
            state: PresentationState::new(),
            surface,
            embeds,
            options: SanitizeOptions::default(),
            keyboard_scope: KeyboardScope::default(),
            events: Vec::new(),
        }
    }

    /// Use custom sanitizer options for every generated document
    pub fn with_sanitize_options(mut self, options: SanitizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_keyboard_scope(mut self, scope: KeyboardScope) -> Self {
        self.keyboard_scope = scope;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn status(&self) -> SurfaceStatus {
        self.state.status()
    }

    pub fn current_index(&self) -> usize {
        self.state.current_activity_index
    }

    pub fn content(&self) -> &LessonContent {
        &self.content
    }

    pub fn current_activity(&self) -> Option<&Activity> {
        self.content.activity(self.state.current_activity_index)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn embeds(&self) -> &EmbedRegistry {
        &self.embeds
    }

    /// Transitions recorded so far
    pub fn events(&self) -> &[PresentationEvent] {
        &self.events
    }

    /// Whether the surface is open, checking it is still alive
    pub fn is_open(&self) -> bool {
        self.state.surface_open && self.surface.is_open()
    }

    /// The document students would see for the current activity
    pub fn current_document(&self) -> StudentDocument {
        StudentDocument::build(
            &self.content,
            self.state.current_activity_index,
            &self.embeds,
            &self.options,
        )
    }

    /// Create the student surface and show the current activity.
    ///
    /// Opening an open surface re-pushes the document. If the host refuses
    /// to create the surface the controller stays closed and returns false.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn open(&mut self) -> bool {
        if self.is_open() {
            return self.push_current();
        }

        match self.surface.open() {
            Ok(()) => {
                self.state.surface_open = true;
                self.record(PresentationEvent::new(
                    self.session_id,
                    PresentationEventType::SurfaceOpened,
                    self.state.current_activity_index,
                    format!("Opened {} surface", self.surface.name()),
                ));
                info!(surface = self.surface.name(), "Presentation surface opened");
                self.push_current()
            }
            Err(e) => {
                self.state.surface_open = false;
                self.record(
                    PresentationEvent::new(
                        self.session_id,
                        PresentationEventType::SurfaceUnavailable,
                        self.state.current_activity_index,
                        "Surface could not be created",
                    )
                    .with_error(e.to_string()),
                );
                warn!(error = %e, "Student surface unavailable");
                false
            }
        }
    }

    /// Release the student surface. Closing a closed controller is a no-op.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn close(&mut self) {
        if !self.state.surface_open && !self.surface.is_open() {
            return;
        }

        self.surface.close();
        self.state.surface_open = false;
        self.record(PresentationEvent::new(
            self.session_id,
            PresentationEventType::SurfaceClosed,
            self.state.current_activity_index,
            "Closed surface",
        ));
        info!("Presentation surface closed");
    }

    /// Move one activity back or forward. Moving past either end does nothing.
    ///
    /// Returns true if the index changed.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        let current = self.state.current_activity_index;
        let target = match direction {
            Direction::Previous => match current.checked_sub(1) {
                Some(i) => i,
                None => return false,
            },
            Direction::Next => current + 1,
        };
        self.select(target)
    }

    /// Jump to an activity. Out-of-range indices are ignored.
    ///
    /// Returns true if the index changed.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.content.activity_count() || index == self.state.current_activity_index {
            debug!(
                index,
                count = self.content.activity_count(),
                "Selection ignored"
            );
            return false;
        }

        self.state.current_activity_index = index;
        self.record(PresentationEvent::new(
            self.session_id,
            PresentationEventType::IndexCommitted,
            index,
            format!("Selected activity {}", index + 1),
        ));

        self.push_current();
        true
    }

    /// Re-push the current document if the surface is open
    pub fn refresh(&mut self) -> bool {
        self.push_current()
    }

    /// Swap in a new lesson snapshot and re-push if open.
    ///
    /// The index is kept, clamped to the new activity list.
    #[instrument(skip(self, content), fields(session = %self.session_id))]
    pub fn replace_content(&mut self, content: LessonContent) -> bool {
        let mut content = content;
        content.sort();

        let count = content.activity_count();
        let index = self
            .state
            .current_activity_index
            .min(count.saturating_sub(1));

        self.embeds.sync_all(&content.resources);
        self.content = content;
        self.state.current_activity_index = index;

        self.record(PresentationEvent::new(
            self.session_id,
            PresentationEventType::ContentReplaced,
            index,
            format!("Lesson content replaced ({} activities)", count),
        ));
        info!(activities = count, index, "Lesson content replaced");

        self.push_current()
    }

    /// Fetch fresh content and apply it. The surface is only touched after
    /// the fetch succeeded; on error the previous content stays up.
    pub async fn reload_from(&mut self, source: &dyn LessonSource) -> Result<(), LessonError> {
        let content = source.fetch().await?;
        self.replace_content(content);
        Ok(())
    }

    /// The host reports that an embed finished loading
    pub fn report_embed_loaded(&mut self, resource_id: &str) -> bool {
        if !self.embeds.mark_loaded(resource_id) {
            return false;
        }

        self.record(
            PresentationEvent::new(
                self.session_id,
                PresentationEventType::EmbedLoaded,
                self.state.current_activity_index,
                "Embed loaded",
            )
            .with_resource(resource_id),
        );
        true
    }

    /// The host reports that an embed failed to load.
    ///
    /// If the resource is on display, the document is re-pushed with the
    /// resource as a fallback card.
    pub fn report_embed_failed(&mut self, resource_id: &str, error: Option<String>) -> bool {
        if !self.embeds.mark_failed(resource_id, error.clone()) {
            return false;
        }

        let mut event = PresentationEvent::new(
            self.session_id,
            PresentationEventType::EmbedFailed,
            self.state.current_activity_index,
            "Embed failed",
        )
        .with_resource(resource_id);
        if let Some(error) = error {
            event = event.with_error(error);
        }
        self.record(event);

        if self.is_displayed(resource_id) {
            self.push_current();
        }
        true
    }

    /// Open a resource of the lesson outside the surface
    pub fn open_resource_externally(&self, resource_id: &str, opener: &dyn ExternalOpener) -> bool {
        match self.content.resource(resource_id) {
            Some(resource) => open_externally(resource, opener),
            None => {
                warn!(resource = resource_id, "Unknown resource");
                false
            }
        }
    }

    /// Map a key press to navigation.
    ///
    /// Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: Key, focus: FocusContext) -> bool {
        if self.keyboard_scope == KeyboardScope::WhenNotEditing && focus == FocusContext::TextInput
        {
            return false;
        }

        match key {
            Key::ArrowLeft => {
                self.navigate(Direction::Previous);
                true
            }
            Key::ArrowRight => {
                self.navigate(Direction::Next);
                true
            }
            Key::Other => false,
        }
    }

    fn is_displayed(&self, resource_id: &str) -> bool {
        match (self.current_activity(), self.content.resource(resource_id)) {
            (Some(activity), Some(resource)) => {
                resource.visible_to_students && resource.belongs_to_activity(&activity.id)
            }
            _ => false,
        }
    }

    /// Build and write the current document. Silent no-op when closed.
    fn push_current(&mut self) -> bool {
        if !self.state.surface_open {
            return false;
        }

        if !self.surface.is_open() {
            self.state.surface_open = false;
            self.record(PresentationEvent::new(
                self.session_id,
                PresentationEventType::SurfaceLost,
                self.state.current_activity_index,
                "Surface closed outside the controller",
            ));
            info!("Student surface is gone, presentation closed");
            return false;
        }

        let document = self.current_document();
        let fingerprint = document.fingerprint();

        match self.surface.write(&document) {
            Ok(()) => {
                self.record(
                    PresentationEvent::new(
                        self.session_id,
                        PresentationEventType::DocumentPushed,
                        document.activity_index,
                        format!("Pushed {}", document.heading),
                    )
                    .with_fingerprint(fingerprint.clone()),
                );
                debug!(
                    activity = document.activity_index,
                    fingerprint = %fingerprint,
                    resources = document.resources.len(),
                    "Pushed student document"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to write student document");
                self.surface.close();
                self.state.surface_open = false;
                self.record(
                    PresentationEvent::new(
                        self.session_id,
                        PresentationEventType::SurfaceLost,
                        self.state.current_activity_index,
                        "Surface write failed",
                    )
                    .with_error(e.to_string()),
                );
                false
            }
        }
    }

    fn record(&mut self, event: PresentationEvent) {
        self.events.push(event);
    }
}

impl<S: SecondarySurface> Drop for PresentationController<S> {
    fn drop(&mut self) {
        if self.surface.is_open() {
            self.surface.close();
        }
    }
}
