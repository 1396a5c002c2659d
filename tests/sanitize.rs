//! Sanitizer Integration Tests
//!
//! Tests for script removal, attribute filtering and iframe hardening.

use classcast::core::sanitize::{sanitize, sanitize_default, SanitizeOptions, IFRAME_SANDBOX};
use pretty_assertions::assert_eq;

const HOSTILE: &[&str] = &[
    "<script>alert(1)</script><p>ok</p>",
    "<SCRIPT SRC=//evil.example/x.js></SCRIPT>",
    "<img src=x onerror=alert(1)>",
    "<a href=\"javascript:alert(1)\">click</a>",
    "<a href=\"vbscript:msgbox(1)\">click</a>",
    "<img src=\"data:image/svg+xml;base64,PHN2Zz4=\">",
    "<iframe src=\"http://evil.example\" sandbox=\"allow-top-navigation\"></iframe>",
    "<svg><script>alert(1)</script></svg>",
    "<math><mtext><script>alert(1)</script></mtext></math>",
    "<noscript><p title=\"</noscript><script>alert(1)</script>\"></noscript>",
    "<object data=\"x.swf\"><embed src=\"x.swf\"></object>",
    "<style>body{display:none}</style><p>visible</p>",
    "<div><p>unclosed <b>tags <i>everywhere",
    "<scr<script>ipt>alert(1)</scr</script>ipt>",
];

#[test]
fn test_never_emits_script() {
    for input in HOSTILE {
        let out = sanitize_default(input).to_lowercase();
        assert!(!out.contains("<script"), "input: {} output: {}", input, out);
        assert!(!out.contains("onerror"), "input: {} output: {}", input, out);
        assert!(!out.contains("javascript:"), "input: {} output: {}", input, out);
        assert!(!out.contains("vbscript:"), "input: {} output: {}", input, out);
        assert!(!out.contains("data:"), "input: {} output: {}", input, out);
        assert!(!out.contains("allow-top-navigation"), "input: {} output: {}", input, out);
    }
}

#[test]
fn test_idempotent_on_hostile_input() {
    for input in HOSTILE {
        let once = sanitize_default(input);
        let twice = sanitize_default(&once);
        assert_eq!(once, twice, "input: {}", input);
    }
}

#[test]
fn test_none_and_blank_are_empty() {
    let options = SanitizeOptions::default();
    assert_eq!(sanitize(None, &options), "");
    assert_eq!(sanitize(Some(""), &options), "");
    assert_eq!(sanitize(Some("   \n"), &options), "");
}

#[test]
fn test_rich_text_survives() {
    let input = "<h2>Steps</h2><ol><li><strong>Cut</strong> the pizza</li><li><em>Count</em> slices</li></ol>";
    assert_eq!(sanitize_default(input), input);
}

#[test]
fn test_iframe_is_sandboxed_and_upgraded() {
    let out = sanitize_default(
        "<iframe src=\"http://www.youtube.com/embed/abc\" sandbox=\"allow-top-navigation\" onload=\"x()\"></iframe>",
    );
    assert_eq!(
        out,
        format!(
            "<iframe sandbox=\"{}\" src=\"https://www.youtube.com/embed/abc\"></iframe>",
            IFRAME_SANDBOX
        )
    );
}

#[test]
fn test_iframe_attributes_cannot_be_widened() {
    let options = SanitizeOptions {
        add_attrs: vec!["style".to_string()],
        ..Default::default()
    };
    let out = sanitize(
        Some("<iframe src=\"https://x.org\" style=\"position:fixed\"></iframe><p style=\"color:red\">a</p>"),
        &options,
    );
    assert!(!out.contains("position:fixed"));
    assert!(out.contains("<p style=\"color:red\">a</p>"));
}

#[test]
fn test_embeds_can_be_disabled() {
    let out = sanitize(
        Some("<p>before</p><iframe src=\"https://x.org\"></iframe><p>after</p>"),
        &SanitizeOptions::without_embeds(),
    );
    assert_eq!(out, "<p>before</p><p>after</p>");
}

#[test]
fn test_idempotent_when_unwrapping_scope_containers() {
    let inputs = [
        "<p><button><p>x</p></button></p>",
        "<ul><li>a<menu><li>b</li></menu></li></ul>",
        "<dl><dt>a<form><dt>b</form></dl>",
        "<h1><button><h2>x</h2></button></h1>",
        "<div><form><p>a<button><p>b</button></form></div>",
    ];
    for input in inputs {
        let once = sanitize_default(input);
        assert_eq!(sanitize_default(&once), once, "input: {}", input);
        assert!(!once.contains("<button"), "input: {} output: {}", input, once);
        assert!(!once.contains("<form"), "input: {} output: {}", input, once);
    }
}

#[test]
fn test_iframe_with_padded_http_source_is_upgraded() {
    let out = sanitize_default(r#"<iframe src="  http://insecure.example/x"></iframe>"#);
    assert!(!out.contains("http://insecure"), "output: {}", out);
    assert_eq!(
        out,
        format!(
            "<iframe sandbox=\"{}\" src=\"https://insecure.example/x\"></iframe>",
            IFRAME_SANDBOX
        )
    );
}
