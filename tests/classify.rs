//! Classification Integration Tests
//!
//! Tests for URL classification and the derived embed URLs.

use classcast::core::{
    classify, extract_youtube_id, google_docs_preview_url, render, to_google_docs_preview_url,
    ResourceType, ViewModel,
};
use classcast::Resource;

#[test]
fn test_classify_each_type() {
    let cases = [
        ("https://cdn.example.com/photo.jpeg", ResourceType::Image),
        ("https://cdn.example.com/anim.GIF", ResourceType::Image),
        ("https://cdn.example.com/icon.svg", ResourceType::Image),
        ("https://cdn.example.com/pic.webp", ResourceType::Image),
        ("https://example.com/worksheet.pdf", ResourceType::Pdf),
        ("https://example.com/clip.mp4", ResourceType::Video),
        ("https://example.com/clip.webm", ResourceType::Video),
        ("https://example.com/clip.ogg", ResourceType::Video),
        ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", ResourceType::YouTube),
        ("https://youtu.be/dQw4w9WgXcQ", ResourceType::YouTube),
        ("https://docs.google.com/document/d/abc/edit", ResourceType::GoogleDoc),
        ("https://example.com/article", ResourceType::Other),
    ];

    for (url, expected) in cases {
        assert_eq!(classify(Some(url)), expected, "url: {}", url);
    }
}

#[test]
fn test_classify_is_case_insensitive() {
    assert_eq!(classify(Some("HTTPS://WWW.YOUTUBE.COM/WATCH")), ResourceType::YouTube);
    assert_eq!(classify(Some("https://x.org/Slides.PDF")), ResourceType::Pdf);
}

#[test]
fn test_classify_missing_is_unknown() {
    assert_eq!(classify(None), ResourceType::Unknown);
    assert_eq!(classify(Some("")), ResourceType::Unknown);
    assert_eq!(classify(Some(" \t ")), ResourceType::Unknown);
}

#[test]
fn test_classify_is_stable() {
    let url = "https://docs.google.com/presentation/d/xyz/edit#slide=id.p";
    let first = classify(Some(url));
    for _ in 0..10 {
        assert_eq!(classify(Some(url)), first);
    }
}

#[test]
fn test_youtube_ids() {
    assert_eq!(
        extract_youtube_id("https://youtu.be/dQw4w9WgXcQ"),
        Some("dQw4w9WgXcQ".to_string())
    );
    assert_eq!(extract_youtube_id("https://example.com"), None);
    assert_eq!(extract_youtube_id(""), None);
}

#[test]
fn test_google_docs_preview_urls() {
    assert_eq!(
        to_google_docs_preview_url("https://docs.google.com/document/d/X/edit"),
        "https://docs.google.com/document/d/X/preview"
    );
    assert_eq!(
        to_google_docs_preview_url("https://docs.google.com/document/d/X"),
        "https://docs.google.com/document/d/X"
    );
    assert_eq!(google_docs_preview_url("https://example.com/d/X/edit"), None);
}

#[test]
fn test_render_follows_classification() {
    let pdf = Resource::new("r", "Notes", "https://x.org/notes.pdf", "a");
    assert!(matches!(render(&pdf), ViewModel::Pdf { .. }));

    let video = Resource::new("r", "Clip", "https://x.org/clip.webm", "a");
    match render(&video) {
        ViewModel::Video { fallback_text, .. } => {
            assert_eq!(fallback_text, "Your browser does not support the video tag.")
        }
        other => panic!("expected video, got {:?}", other),
    }

    let link = Resource::new("r", "Site", "https://example.com", "a");
    assert!(render(&link).is_fallback());
}
