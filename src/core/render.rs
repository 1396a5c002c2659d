//! Per-resource embed rendering.
//!
//! Each [`ResourceType`] maps to its own render strategy; the strategies are
//! independent functions picked from a dispatch table, so each can be
//! exercised on its own. A resource whose embed failed to load is always
//! rendered as a fallback card, whatever its type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapters::ExternalOpener;
use crate::domain::Resource;

use super::classify::{classify, extract_youtube_id, google_docs_preview_url, ResourceType};
use super::sanitize::{escape_attr, escape_html};

/// Query appended to PDF sources to hide the viewer toolbar and side panes
pub const PDF_VIEWER_PARAMS: &str = "#toolbar=0&navpanes=0";

/// Privacy-enhanced YouTube embed host
pub const YOUTUBE_EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";

/// Permissions granted to the YouTube player frame
pub const YOUTUBE_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Text shown by browsers that cannot play the video
pub const VIDEO_FALLBACK_TEXT: &str = "Your browser does not support the video tag.";

/// Why a resource is shown as a fallback card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The type cannot be embedded (other/unknown)
    Unsupported,

    /// YouTube link without a usable video id
    InvalidYouTubeUrl,

    /// Google Docs link that could not be turned into a preview
    UnresolvableGoogleDoc,

    /// The embed reported a load failure
    LoadFailed,
}

/// Card shown in place of an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackView {
    /// Resource title
    pub title: String,

    /// URL opened by the action, if any
    pub url: Option<String>,

    /// Secondary line (file name or a description)
    pub label: String,

    /// Text of the "open externally" action
    pub action_label: String,

    /// Visible warning, e.g. "Invalid YouTube URL"
    pub indicator: Option<String>,

    /// Icon hint
    pub icon: String,

    /// Why this resource is not embedded
    pub reason: FallbackReason,
}

/// Type-specific view of a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ViewModel {
    Image {
        title: String,
        src: String,
        alt: String,
    },
    Pdf {
        title: String,
        url: String,
        src: String,
    },
    Video {
        title: String,
        src: String,
        fallback_text: String,
    },
    YouTube {
        title: String,
        url: String,
        embed_id: String,
        embed_url: String,
    },
    GoogleDoc {
        title: String,
        url: String,
        preview_url: String,
    },
    Fallback(FallbackView),
}

type RenderStrategy = fn(&Resource) -> ViewModel;

/// Pick the render strategy for a resource type
pub fn strategy_for(resource_type: ResourceType) -> RenderStrategy {
    match resource_type {
        ResourceType::Image => render_image,
        ResourceType::Pdf => render_pdf,
        ResourceType::Video => render_video,
        ResourceType::YouTube => render_youtube,
        ResourceType::GoogleDoc => render_google_doc,
        ResourceType::Other | ResourceType::Unknown => render_unsupported,
    }
}

/// Render a resource according to its classified type
pub fn render(resource: &Resource) -> ViewModel {
    let resource_type = classify(resource.file_url.as_deref());
    strategy_for(resource_type)(resource)
}

/// Render a resource taking its load state into account
pub fn render_with_state(resource: &Resource, state: EmbedState) -> ViewModel {
    match state {
        EmbedState::Failed => fallback(resource, FallbackReason::LoadFailed),
        EmbedState::Loading | EmbedState::Loaded => render(resource),
    }
}

fn render_image(resource: &Resource) -> ViewModel {
    ViewModel::Image {
        title: resource.title.clone(),
        src: resource.url().to_string(),
        alt: resource.title.clone(),
    }
}

fn render_pdf(resource: &Resource) -> ViewModel {
    ViewModel::Pdf {
        title: resource.title.clone(),
        url: resource.url().to_string(),
        src: format!("{}{}", resource.url(), PDF_VIEWER_PARAMS),
    }
}

fn render_video(resource: &Resource) -> ViewModel {
    ViewModel::Video {
        title: resource.title.clone(),
        src: resource.url().to_string(),
        fallback_text: VIDEO_FALLBACK_TEXT.to_string(),
    }
}

fn render_youtube(resource: &Resource) -> ViewModel {
    match extract_youtube_id(resource.url()) {
        Some(embed_id) => ViewModel::YouTube {
            title: resource.title.clone(),
            url: resource.url().to_string(),
            embed_url: format!("{}{}", YOUTUBE_EMBED_BASE, embed_id),
            embed_id,
        },
        None => fallback(resource, FallbackReason::InvalidYouTubeUrl),
    }
}

fn render_google_doc(resource: &Resource) -> ViewModel {
    match google_docs_preview_url(resource.url()) {
        Some(preview_url) => ViewModel::GoogleDoc {
            title: resource.title.clone(),
            url: resource.url().to_string(),
            preview_url,
        },
        None => fallback(resource, FallbackReason::UnresolvableGoogleDoc),
    }
}

fn render_unsupported(resource: &Resource) -> ViewModel {
    fallback(resource, FallbackReason::Unsupported)
}

fn fallback(resource: &Resource, reason: FallbackReason) -> ViewModel {
    let resource_type = classify(resource.file_url.as_deref());
    let url = resource
        .file_url
        .as_ref()
        .filter(|u| !u.trim().is_empty())
        .cloned();

    let (label, action_label, indicator) = match reason {
        FallbackReason::InvalidYouTubeUrl => (
            "YouTube video could not be embedded".to_string(),
            "Watch on YouTube",
            Some("Invalid YouTube URL".to_string()),
        ),
        FallbackReason::UnresolvableGoogleDoc => {
            ("Google Document".to_string(), "Open in Google Docs", None)
        }
        FallbackReason::LoadFailed => (
            file_label(resource),
            "Open",
            Some("This resource could not be loaded".to_string()),
        ),
        FallbackReason::Unsupported => (file_label(resource), "Open", None),
    };

    ViewModel::Fallback(FallbackView {
        title: resource.title.clone(),
        url,
        label,
        action_label: action_label.to_string(),
        indicator,
        icon: resource_type.icon().to_string(),
        reason,
    })
}

fn file_label(resource: &Resource) -> String {
    resource
        .file_name
        .as_ref()
        .filter(|n| !n.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| "Resource file".to_string())
}

impl ViewModel {
    /// Resource title
    pub fn title(&self) -> &str {
        match self {
            ViewModel::Image { title, .. }
            | ViewModel::Pdf { title, .. }
            | ViewModel::Video { title, .. }
            | ViewModel::YouTube { title, .. }
            | ViewModel::GoogleDoc { title, .. } => title,
            ViewModel::Fallback(view) => &view.title,
        }
    }

    /// URL the title links to
    pub fn link(&self) -> Option<&str> {
        match self {
            ViewModel::Image { src, .. } | ViewModel::Video { src, .. } => Some(src),
            ViewModel::Pdf { url, .. }
            | ViewModel::YouTube { url, .. }
            | ViewModel::GoogleDoc { url, .. } => Some(url),
            ViewModel::Fallback(view) => view.url.as_deref(),
        }
    }

    /// Whether this is a fallback card
    pub fn is_fallback(&self) -> bool {
        matches!(self, ViewModel::Fallback(_))
    }

    /// Short tag used as a CSS class
    pub fn kind(&self) -> &'static str {
        match self {
            ViewModel::Image { .. } => "image",
            ViewModel::Pdf { .. } => "pdf",
            ViewModel::Video { .. } => "video",
            ViewModel::YouTube { .. } => "youtube",
            ViewModel::GoogleDoc { .. } => "google-doc",
            ViewModel::Fallback(_) => "fallback",
        }
    }

    /// Markup for one resource block: a header link followed by the body
    pub fn to_html(&self) -> String {
        let header = match self.link() {
            Some(url) => format!(
                r#"<a href="{}" class="resource-title" target="_blank" rel="noopener noreferrer">{}</a>"#,
                escape_attr(url),
                escape_html(self.title())
            ),
            None => format!(r#"<span class="resource-title">{}</span>"#, escape_html(self.title())),
        };

        let body = match self {
            ViewModel::Image { src, alt, .. } => format!(
                r#"<div class="resource-content"><img src="{}" alt="{}" class="resource-image"></div>"#,
                escape_attr(src),
                escape_attr(alt)
            ),
            ViewModel::Pdf { src, .. } => format!(
                r#"<div class="resource-content"><iframe src="{}" frameborder="0"></iframe></div>"#,
                escape_attr(src)
            ),
            ViewModel::Video { src, fallback_text, .. } => format!(
                r#"<div class="resource-content"><video src="{}" controls class="resource-video">{}</video></div>"#,
                escape_attr(src),
                escape_html(fallback_text)
            ),
            ViewModel::YouTube { embed_url, .. } => format!(
                r#"<div class="resource-content youtube-container"><iframe src="{}" allow="{}" allowfullscreen frameborder="0"></iframe></div>"#,
                escape_attr(embed_url),
                YOUTUBE_ALLOW
            ),
            ViewModel::GoogleDoc { preview_url, .. } => format!(
                r#"<div class="resource-content"><iframe src="{}" frameborder="0"></iframe></div>"#,
                escape_attr(preview_url)
            ),
            ViewModel::Fallback(view) => fallback_html(view),
        };

        format!(
            r#"<div class="resource resource-{}"><div class="resource-header">{}</div>{}</div>"#,
            self.kind(),
            header,
            body
        )
    }
}

fn fallback_html(view: &FallbackView) -> String {
    let mut html = String::from(r#"<div class="resource-fallback">"#);
    html.push_str(&format!("<p>{}</p>", escape_html(&view.label)));

    if let Some(indicator) = &view.indicator {
        html.push_str(&format!(
            r#"<p class="resource-warning">{}</p>"#,
            escape_html(indicator)
        ));
    }

    if let Some(url) = &view.url {
        html.push_str(&format!(
            r#"<a href="{}" class="resource-open-button" target="_blank" rel="noopener noreferrer">{}</a>"#,
            escape_attr(url),
            escape_html(&view.action_label)
        ));
    }

    html.push_str("</div>");
    html
}

/// Load state of one embedded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedState {
    Loading,
    Loaded,
    Failed,
}

impl Default for EmbedState {
    fn default() -> Self {
        Self::Loading
    }
}

/// Lifecycle of one embed, keyed by the URL it was created for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedView {
    resource_id: String,
    file_url: Option<String>,
    state: EmbedState,
    error: Option<String>,
}

impl EmbedView {
    /// Start tracking a resource in the `Loading` state
    pub fn new(resource: &Resource) -> Self {
        Self {
            resource_id: resource.id.clone(),
            file_url: resource.file_url.clone(),
            state: EmbedState::Loading,
            error: None,
        }
    }

    pub fn state(&self) -> EmbedState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Follow a possibly swapped resource; resets to `Loading` if the URL changed.
    ///
    /// Returns true if the view was reset.
    pub fn sync(&mut self, resource: &Resource) -> bool {
        if self.file_url == resource.file_url {
            return false;
        }
        debug!(resource = %resource.id, "Embed source changed, reloading");
        self.file_url = resource.file_url.clone();
        self.state = EmbedState::Loading;
        self.error = None;
        true
    }

    /// The embed finished loading. Only meaningful while `Loading`.
    pub fn mark_loaded(&mut self) -> bool {
        if self.state != EmbedState::Loading {
            return false;
        }
        self.state = EmbedState::Loaded;
        true
    }

    /// The embed failed. Sticky until the URL changes.
    pub fn mark_failed(&mut self, error: Option<String>) -> bool {
        if self.state == EmbedState::Failed {
            return false;
        }
        warn!(resource = %self.resource_id, error = ?error, "Embed failed to load");
        self.state = EmbedState::Failed;
        self.error = error;
        true
    }

    /// View model for the tracked resource
    pub fn view_model(&self, resource: &Resource) -> ViewModel {
        render_with_state(resource, self.state)
    }
}

/// Embed lifecycles for every resource of a lesson
#[derive(Debug, Clone, Default)]
pub struct EmbedRegistry {
    views: HashMap<String, EmbedView>,
}

impl EmbedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track exactly the given resources, resetting any whose URL changed
    pub fn sync_all<'a>(&mut self, resources: impl IntoIterator<Item = &'a Resource>) {
        let mut next = HashMap::new();

        for resource in resources {
            let view = match self.views.remove(&resource.id) {
                Some(mut view) => {
                    view.sync(resource);
                    view
                }
                None => EmbedView::new(resource),
            };
            next.insert(resource.id.clone(), view);
        }

        self.views = next;
    }

    /// Current state of a resource (untracked resources count as `Loading`)
    pub fn state(&self, resource_id: &str) -> EmbedState {
        self.views
            .get(resource_id)
            .map(|v| v.state())
            .unwrap_or_default()
    }

    pub fn view(&self, resource_id: &str) -> Option<&EmbedView> {
        self.views.get(resource_id)
    }

    /// Returns true if the state changed
    pub fn mark_loaded(&mut self, resource_id: &str) -> bool {
        self.views
            .get_mut(resource_id)
            .map(|v| v.mark_loaded())
            .unwrap_or(false)
    }

    /// Returns true if the state changed
    pub fn mark_failed(&mut self, resource_id: &str, error: Option<String>) -> bool {
        self.views
            .get_mut(resource_id)
            .map(|v| v.mark_failed(error))
            .unwrap_or(false)
    }

    /// Render a resource with its tracked state
    pub fn render(&self, resource: &Resource) -> ViewModel {
        render_with_state(resource, self.state(&resource.id))
    }
}

/// Ask the host to open a resource outside the display.
///
/// Returns false if the resource has no URL or the opener refused.
pub fn open_externally(resource: &Resource, opener: &dyn ExternalOpener) -> bool {
    let url = resource.url().trim();
    if url.is_empty() {
        return false;
    }

    match opener.open_url(url) {
        Ok(()) => {
            info!(resource = %resource.id, "Opened resource externally");
            true
        }
        Err(e) => {
            warn!(resource = %resource.id, error = %e, "Could not open resource externally");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingOpener;

    fn resource(url: &str) -> Resource {
        Resource::new("r1", "Diagram", url, "a1")
    }

    #[test]
    fn test_render_image_uses_title_as_alt() {
        let view = render(&resource("https://x.org/d.png"));
        assert_eq!(
            view,
            ViewModel::Image {
                title: "Diagram".to_string(),
                src: "https://x.org/d.png".to_string(),
                alt: "Diagram".to_string(),
            }
        );
    }

    #[test]
    fn test_render_pdf_hides_viewer_chrome() {
        match render(&resource("https://x.org/notes.pdf")) {
            ViewModel::Pdf { src, .. } => {
                assert_eq!(src, "https://x.org/notes.pdf#toolbar=0&navpanes=0")
            }
            other => panic!("expected pdf, got {:?}", other),
        }
    }

    #[test]
    fn test_render_youtube_and_invalid_youtube() {
        match render(&resource("https://youtu.be/dQw4w9WgXcQ")) {
            ViewModel::YouTube { embed_id, embed_url, .. } => {
                assert_eq!(embed_id, "dQw4w9WgXcQ");
                assert_eq!(embed_url, "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ");
            }
            other => panic!("expected youtube, got {:?}", other),
        }

        match render(&resource("https://www.youtube.com/channel/abc")) {
            ViewModel::Fallback(view) => {
                assert_eq!(view.reason, FallbackReason::InvalidYouTubeUrl);
                assert_eq!(view.indicator.as_deref(), Some("Invalid YouTube URL"));
                assert_eq!(view.action_label, "Watch on YouTube");
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_render_google_doc_preview() {
        match render(&resource("https://docs.google.com/document/d/X/edit")) {
            ViewModel::GoogleDoc { preview_url, .. } => {
                assert_eq!(preview_url, "https://docs.google.com/document/d/X/preview")
            }
            other => panic!("expected google doc, got {:?}", other),
        }
    }

    #[test]
    fn test_render_other_and_unknown_fall_back() {
        let other = render(&resource("https://example.com/page").with_file_name("page.html"));
        match other {
            ViewModel::Fallback(view) => {
                assert_eq!(view.label, "page.html");
                assert_eq!(view.url.as_deref(), Some("https://example.com/page"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }

        let mut missing = resource("");
        missing.file_url = None;
        match render(&missing) {
            ViewModel::Fallback(view) => {
                assert_eq!(view.label, "Resource file");
                assert!(view.url.is_none());
                assert_eq!(view.action_label, "Open");
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_state_forces_fallback() {
        let r = resource("https://x.org/d.png");
        let view = render_with_state(&r, EmbedState::Failed);
        assert!(view.is_fallback());
        assert!(!render_with_state(&r, EmbedState::Loaded).is_fallback());
    }

    #[test]
    fn test_embed_view_lifecycle_resets_on_new_url() {
        let r = resource("https://x.org/a.png");
        let mut view = EmbedView::new(&r);
        assert_eq!(view.state(), EmbedState::Loading);

        assert!(view.mark_failed(Some("404".to_string())));
        assert_eq!(view.state(), EmbedState::Failed);
        assert!(!view.mark_loaded());

        // Same URL: stays failed
        assert!(!view.sync(&r));
        assert_eq!(view.state(), EmbedState::Failed);

        let swapped = resource("https://x.org/b.png");
        assert!(view.sync(&swapped));
        assert_eq!(view.state(), EmbedState::Loading);
        assert!(view.error().is_none());
        assert!(view.mark_loaded());
        assert_eq!(view.state(), EmbedState::Loaded);
    }

    #[test]
    fn test_registry_failures_are_independent() {
        let a = Resource::new("a", "A", "https://x.org/a.png", "act");
        let b = Resource::new("b", "B", "https://x.org/b.png", "act");
        let mut registry = EmbedRegistry::new();
        registry.sync_all([&a, &b]);

        assert!(registry.mark_failed("a", None));
        assert!(registry.render(&a).is_fallback());
        assert!(!registry.render(&b).is_fallback());
        assert_eq!(registry.state("b"), EmbedState::Loading);

        // Untracked ids are ignored
        assert!(!registry.mark_failed("missing", None));

        // Dropping a resource forgets its state
        registry.sync_all([&b]);
        assert!(registry.view("a").is_none());
    }

    #[test]
    fn test_block_html_escapes_title() {
        let r = Resource::new("r", "<b>Tom & Jerry</b>", "https://x.org/a.png", "act");
        let html = render(&r).to_html();
        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"));
        assert!(html.contains(r#"class="resource resource-image""#));
    }

    #[test]
    fn test_open_externally_uses_opener() {
        let opener = RecordingOpener::new();
        assert!(open_externally(&resource("https://example.com/x"), &opener));

        let mut missing = resource("");
        missing.file_url = None;
        assert!(!open_externally(&missing, &opener));

        assert_eq!(opener.opened(), vec!["https://example.com/x".to_string()]);
    }
}
