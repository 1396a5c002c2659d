//! Allow-list markup sanitizing.
//!
//! Rich text from the data layer is parsed into a DOM and re-serialized,
//! keeping only allow-listed tags and attributes. The serializer is the only
//! producer of output markup, so nothing the parser did not understand can
//! leak through.
//!
//! Unwrapping a container can leave block elements nested in a way the
//! parser rebuilds differently on the next read (`<p><button><p>` becomes
//! `<p><p>`). [`sanitize`] therefore re-reads its own output until it stops
//! changing, so sanitizing a sanitized string returns it unchanged.
//!
//! Fixed rules that no [`SanitizeOptions`] can relax:
//! - `script` and `style` elements are removed together with their content
//! - `on*` event-handler attributes are removed everywhere
//! - `iframe` keeps only `src`, `allow`, `allowfullscreen`, `frameborder`
//!   and `sandbox`; its `sandbox` is forced to [`IFRAME_SANDBOX`] and an
//!   `http:` source is upgraded to `https:`

use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sandbox capabilities forced onto every surviving iframe.
///
/// Deliberately lacks `allow-top-navigation`.
pub const IFRAME_SANDBOX: &str = "allow-scripts allow-same-origin allow-popups allow-forms";

const IFRAME_ATTRS: &[&str] = &["src", "allow", "allowfullscreen", "frameborder", "sandbox"];

/// Removed with everything inside them, whatever the options say
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "object", "embed", "applet", "template", "noscript", "noembed",
    "noframes", "frame", "frameset", "head", "title", "meta", "link", "base", "textarea",
    "xmp", "plaintext", "select", "svg", "math",
];

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "article", "b", "blockquote", "br", "caption", "cite", "code", "col",
    "colgroup", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "ins", "kbd",
    "li", "main", "mark", "ol", "p", "pre", "q", "s", "section", "small", "source", "span",
    "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
    "u", "ul", "video",
];

const GLOBAL_ATTRS: &[&str] = &["class", "id", "title", "lang", "dir"];

const URL_ATTRS: &[&str] = &["href", "src", "cite", "poster"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Upper bound on parse/serialize passes in [`sanitize`]
const MAX_PASSES: usize = 6;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn tag_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "target", "rel", "name"],
        "img" => &["src", "alt", "width", "height", "loading"],
        "video" => &["src", "controls", "poster", "width", "height", "preload", "loop", "muted"],
        "source" => &["src", "type"],
        "td" | "th" => &["colspan", "rowspan", "scope"],
        "col" | "colgroup" => &["span"],
        "ol" => &["start", "reversed"],
        "blockquote" | "q" | "del" | "ins" => &["cite"],
        "details" => &["open"],
        _ => &[],
    }
}

/// Caller-tunable parts of the allow-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeOptions {
    /// Keep `iframe` embeds (with the fixed attribute set)
    pub allow_embeds: bool,

    /// Extra tags to keep
    pub add_tags: Vec<String>,

    /// Extra attributes to keep on any non-iframe tag
    pub add_attrs: Vec<String>,

    /// Tags to unwrap even if otherwise allowed (content is kept)
    pub forbid_tags: Vec<String>,

    /// Attributes to drop even if otherwise allowed
    pub forbid_attrs: Vec<String>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            allow_embeds: true,
            add_tags: Vec::new(),
            add_attrs: Vec::new(),
            forbid_tags: Vec::new(),
            forbid_attrs: Vec::new(),
        }
    }
}

impl SanitizeOptions {
    /// Options that drop embeds entirely
    pub fn without_embeds() -> Self {
        Self {
            allow_embeds: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Keep,
    Unwrap,
    Drop,
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|s| s.eq_ignore_ascii_case(name))
}

struct Sanitizer<'a> {
    options: &'a SanitizeOptions,
    out: String,
    removed: usize,
}

impl<'a> Sanitizer<'a> {
    fn new(options: &'a SanitizeOptions, capacity: usize) -> Self {
        Self {
            options,
            out: String::with_capacity(capacity),
            removed: 0,
        }
    }

    fn disposition(&self, tag: &str) -> Disposition {
        if DROP_WITH_CONTENT.contains(&tag) {
            return Disposition::Drop;
        }
        if tag == "iframe" {
            return if self.options.allow_embeds && !contains(&self.options.forbid_tags, tag) {
                Disposition::Keep
            } else {
                Disposition::Drop
            };
        }
        if contains(&self.options.forbid_tags, tag) {
            return Disposition::Unwrap;
        }
        if ALLOWED_TAGS.contains(&tag) || contains(&self.options.add_tags, tag) {
            Disposition::Keep
        } else {
            Disposition::Unwrap
        }
    }

    fn keep_attr(&self, tag: &str, name: &str, value: &str) -> bool {
        if name.starts_with("on") || contains(&self.options.forbid_attrs, name) {
            return false;
        }

        let allowed = if tag == "iframe" {
            IFRAME_ATTRS.contains(&name)
        } else {
            GLOBAL_ATTRS.contains(&name)
                || tag_attrs(tag).contains(&name)
                || contains(&self.options.add_attrs, name)
        };

        allowed && (!URL_ATTRS.contains(&name) || is_safe_url(value))
    }

    fn walk_children(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => escape_text_into(text, &mut self.out),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.walk_element(element);
                    }
                }
                // Comments, doctypes and processing instructions never survive
                _ => self.removed += 1,
            }
        }
    }

    fn walk_element(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();

        match self.disposition(tag) {
            Disposition::Drop => {
                self.removed += 1;
            }
            Disposition::Unwrap => {
                self.removed += 1;
                self.walk_children(element);
            }
            Disposition::Keep => {
                let attrs = self.collect_attrs(tag, element);

                self.out.push('<');
                self.out.push_str(tag);
                for (name, value) in &attrs {
                    self.out.push(' ');
                    self.out.push_str(name);
                    self.out.push_str("=\"");
                    escape_attr_into(value, &mut self.out);
                    self.out.push('"');
                }
                self.out.push('>');

                if VOID_TAGS.contains(&tag) {
                    return;
                }

                // Iframe children are raw text to the parser; never emit them
                if tag != "iframe" {
                    if matches!(tag, "pre" | "listing") && starts_with_newline(element) {
                        self.out.push('\n');
                    }
                    self.walk_children(element);
                }

                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push('>');
            }
        }
    }

    fn collect_attrs(&mut self, tag: &str, element: ElementRef<'_>) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = Vec::new();

        for (name, value) in element.value().attrs() {
            if !self.keep_attr(tag, name, value) {
                self.removed += 1;
                continue;
            }
            if tag == "iframe" && name == "sandbox" {
                continue;
            }
            let value = if tag == "iframe" && name == "src" {
                upgrade_insecure_scheme(value)
            } else {
                value.to_string()
            };
            attrs.push((name.to_string(), value));
        }

        if tag == "iframe" {
            attrs.push(("sandbox".to_string(), IFRAME_SANDBOX.to_string()));
        }

        attrs.sort_by(|a, b| a.0.cmp(&b.0));
        attrs
    }
}

fn starts_with_newline(element: ElementRef<'_>) -> bool {
    element
        .first_child()
        .and_then(|child| match child.value() {
            Node::Text(text) => Some(text.starts_with('\n')),
            _ => None,
        })
        .unwrap_or(false)
}

/// Sanitize rich text.
///
/// `None` is treated as an empty document.
pub fn sanitize(html: Option<&str>, options: &SanitizeOptions) -> String {
    let html = html.unwrap_or("");
    if html.trim().is_empty() {
        return String::new();
    }

    let (mut out, removed) = sanitize_pass(html, options);
    if removed > 0 {
        debug!(removed, "Stripped disallowed markup");
    }

    for pass in 1..MAX_PASSES {
        let (next, _) = sanitize_pass(&out, options);
        if next == out {
            return out;
        }
        debug!(pass, "Sanitized markup re-nested on re-parse");
        out = next;
    }

    warn!(passes = MAX_PASSES, "Sanitized markup did not settle");
    out
}

fn sanitize_pass(html: &str, options: &SanitizeOptions) -> (String, usize) {
    let fragment = Html::parse_fragment(html);
    let mut sanitizer = Sanitizer::new(options, html.len());
    sanitizer.walk_children(fragment.root_element());
    (sanitizer.out, sanitizer.removed)
}

/// Sanitize with the default options
pub fn sanitize_default(html: &str) -> String {
    sanitize(Some(html), &SanitizeOptions::default())
}

/// Rewrite an `http:` URL to `https:`, leaving everything after the scheme alone.
///
/// Whitespace and control characters around or inside the scheme are
/// ignored by browsers, so they are ignored (and dropped) here too.
pub fn upgrade_insecure_scheme(url: &str) -> String {
    if let Some(colon) = url.find(':') {
        let scheme: String = url[..colon]
            .chars()
            .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
            .collect();
        if scheme.eq_ignore_ascii_case("http") {
            return format!("https:{}", &url[colon + 1..]);
        }
    }
    url.to_string()
}

/// Whether a URL attribute value uses an allowed scheme (or none at all)
fn is_safe_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = compact.find(':');
    let path_start = compact.find(|c| c == '/' || c == '?' || c == '#');

    match (scheme_end, path_start) {
        (Some(colon), Some(slash)) if slash < colon => true,
        (Some(colon), _) => SAFE_SCHEMES.contains(&&compact[..colon]),
        (None, _) => true,
    }
}

/// Escape text for inclusion in element content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_text_into(text, &mut out);
    out
}

/// Escape text for inclusion in a double-quoted attribute value
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_attr_into(text, &mut out);
    out
}

fn escape_text_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
