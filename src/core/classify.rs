//! Resource classification from URLs.
//!
//! Classification is a pure function of the URL string: no network access,
//! no shared state. The rules are checked in a fixed priority order and the
//! first match wins.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "gif", "png", "svg", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov"];

/// Length of every valid YouTube video id
pub const YOUTUBE_ID_LEN: usize = 11;

static YOUTUBE_ID: OnceLock<Regex> = OnceLock::new();

/// How a resource should be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Still image shown inline
    Image,

    /// PDF shown in a frame without viewer chrome
    Pdf,

    /// Directly playable video file
    Video,

    /// YouTube link, embedded through the privacy-enhanced player
    YouTube,

    /// Google Docs document shown in preview mode
    GoogleDoc,

    /// Any other link; opened externally
    Other,

    /// No URL at all
    Unknown,
}

impl ResourceType {
    /// Stable tag used in markup and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Pdf => "pdf",
            ResourceType::Video => "video",
            ResourceType::YouTube => "youtube",
            ResourceType::GoogleDoc => "google_doc",
            ResourceType::Other => "other",
            ResourceType::Unknown => "unknown",
        }
    }

    /// Icon hint for cards and fallback views
    pub fn icon(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Pdf => "file-text",
            ResourceType::Video | ResourceType::YouTube => "video",
            ResourceType::GoogleDoc => "link",
            ResourceType::Other | ResourceType::Unknown => "file",
        }
    }

    /// Whether this type can be embedded at all
    pub fn is_embeddable(&self) -> bool {
        !matches!(self, ResourceType::Other | ResourceType::Unknown)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "image" => Ok(ResourceType::Image),
            "pdf" => Ok(ResourceType::Pdf),
            "video" => Ok(ResourceType::Video),
            "youtube" | "yt" => Ok(ResourceType::YouTube),
            "google_doc" | "google-doc" | "gdoc" => Ok(ResourceType::GoogleDoc),
            "other" => Ok(ResourceType::Other),
            "unknown" => Ok(ResourceType::Unknown),
            _ => anyhow::bail!("Unknown resource type: {}", s),
        }
    }
}

/// Classify a resource URL.
///
/// Missing or blank URLs are [`ResourceType::Unknown`]; anything else that
/// matches no rule is [`ResourceType::Other`].
pub fn classify(url: Option<&str>) -> ResourceType {
    let url = match url.map(str::trim) {
        Some(u) if !u.is_empty() => u,
        _ => return ResourceType::Unknown,
    };

    let lower = url.to_lowercase();
    let path = strip_query_and_fragment(&lower);

    if has_extension(path, IMAGE_EXTENSIONS) {
        return ResourceType::Image;
    }
    if has_extension(path, &["pdf"]) {
        return ResourceType::Pdf;
    }
    if has_extension(path, VIDEO_EXTENSIONS) {
        return ResourceType::Video;
    }
    if lower.contains("youtube.com") || lower.contains("youtu.be") {
        return ResourceType::YouTube;
    }
    if lower.contains("docs.google.com") {
        return ResourceType::GoogleDoc;
    }

    ResourceType::Other
}

fn strip_query_and_fragment(url: &str) -> &str {
    let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| {
        path.len() > ext.len() + 1
            && path.ends_with(ext)
            && path.as_bytes()[path.len() - ext.len() - 1] == b'.'
    })
}

fn youtube_id_regex() -> &'static Regex {
    YOUTUBE_ID.get_or_init(|| {
        Regex::new(r"^.*((youtu\.be/)|(v/)|(/u/\w/)|(embed/)|(watch\?))\??v?=?([^#&?]*).*")
            .expect("YouTube id pattern is valid")
    })
}

/// Extract the 11-character video id from a YouTube URL.
///
/// Returns `None` when nothing matches or the captured segment has the
/// wrong length.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let caps = youtube_id_regex().captures(url)?;
    let id = caps.get(7)?.as_str();

    if id.chars().count() == YOUTUBE_ID_LEN {
        Some(id.to_string())
    } else {
        None
    }
}

/// Rewrite the first `/edit` path segment of a URL to `/preview`.
///
/// URLs without such a segment come back unchanged.
pub fn to_google_docs_preview_url(url: &str) -> String {
    let mut search_from = 0;

    while let Some(pos) = url[search_from..].find("/edit") {
        let start = search_from + pos;
        let end = start + "/edit".len();
        let at_boundary = url[end..]
            .chars()
            .next()
            .map_or(true, |c| matches!(c, '/' | '?' | '#'));

        if at_boundary {
            return format!("{}/preview{}", &url[..start], &url[end..]);
        }
        search_from = end;
    }

    url.to_string()
}

/// Preview URL for a Google Docs link, or `None` if the URL is not one.
pub fn google_docs_preview_url(url: &str) -> Option<String> {
    if url.trim().is_empty() || !url.to_lowercase().contains("docs.google.com") {
        return None;
    }
    Some(to_google_docs_preview_url(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(classify(Some("https://cdn.example.com/a.PNG")), ResourceType::Image);
        assert_eq!(classify(Some("https://x.org/notes.pdf")), ResourceType::Pdf);
        assert_eq!(classify(Some("https://x.org/clip.MOV")), ResourceType::Video);
        // An image extension wins over a YouTube host
        assert_eq!(
            classify(Some("https://youtube.com/thumb.jpg")),
            ResourceType::Image
        );
        assert_eq!(
            classify(Some("https://docs.google.com/document/d/1/edit")),
            ResourceType::GoogleDoc
        );
    }

    #[test]
    fn test_classify_ignores_query_when_checking_extension() {
        assert_eq!(
            classify(Some("https://store.example.com/w.png?token=abc")),
            ResourceType::Image
        );
        assert_eq!(
            classify(Some("https://youtube.com/watch?v=abc.png")),
            ResourceType::YouTube
        );
    }

    #[test]
    fn test_classify_missing_url() {
        assert_eq!(classify(None), ResourceType::Unknown);
        assert_eq!(classify(Some("")), ResourceType::Unknown);
        assert_eq!(classify(Some("   ")), ResourceType::Unknown);
        assert_eq!(classify(Some("https://example.com")), ResourceType::Other);
        // A bare extension is not a file name
        assert_eq!(classify(Some(".png")), ResourceType::Other);
    }

    #[test]
    fn test_resource_type_round_trip_names() {
        for ty in [
            ResourceType::Image,
            ResourceType::Pdf,
            ResourceType::Video,
            ResourceType::YouTube,
            ResourceType::GoogleDoc,
            ResourceType::Other,
            ResourceType::Unknown,
        ] {
            assert_eq!(ty.to_string().parse::<ResourceType>().unwrap(), ty);
        }
        assert!("spreadsheet".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_extract_youtube_id_forms() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQ"), id);
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            id
        );
        assert_eq!(extract_youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(extract_youtube_id("https://www.youtube.com/v/dQw4w9WgXcQ"), id);
    }

    #[test]
    fn test_extract_youtube_id_rejects_wrong_length() {
        assert_eq!(extract_youtube_id("https://example.com"), None);
        assert_eq!(extract_youtube_id("https://youtu.be/short"), None);
        assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQxyz"), None);
    }

    #[test]
    fn test_google_docs_preview() {
        assert_eq!(
            to_google_docs_preview_url("https://docs.google.com/document/d/X/edit"),
            "https://docs.google.com/document/d/X/preview"
        );
        assert_eq!(
            to_google_docs_preview_url("https://docs.google.com/document/d/X/edit?usp=sharing"),
            "https://docs.google.com/document/d/X/preview?usp=sharing"
        );
        assert_eq!(
            to_google_docs_preview_url("https://docs.google.com/document/d/X/view"),
            "https://docs.google.com/document/d/X/view"
        );
        // "/editor" is not an edit segment
        assert_eq!(
            to_google_docs_preview_url("https://example.com/editor/edit"),
            "https://example.com/editor/preview"
        );
    }

    #[test]
    fn test_google_docs_preview_requires_docs_host() {
        assert_eq!(google_docs_preview_url("https://example.com/edit"), None);
        assert_eq!(google_docs_preview_url(""), None);
        assert_eq!(
            google_docs_preview_url("https://docs.google.com/d/1/edit"),
            Some("https://docs.google.com/d/1/preview".to_string())
        );
    }
}
