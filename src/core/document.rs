//! Student document generation.
//!
//! A [`StudentDocument`] is rebuilt from scratch for every push. It only
//! ever contains student-facing material: sanitized student instructions and
//! the visible resources of one activity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::LessonContent;

use super::classify::{classify, ResourceType};
use super::render::EmbedRegistry;
use super::sanitize::{escape_html, sanitize, SanitizeOptions};

pub const NO_INSTRUCTIONS: &str = "No student instructions for this activity";
pub const NO_RESOURCES: &str = "No resources available for students";
pub const NO_ACTIVITIES: &str = "This lesson has no activities yet";

const STYLESHEET: &str = r#"
body { margin: 0; font-family: system-ui, -apple-system, "Segoe UI", sans-serif; background: #f8fafc; color: #0f172a; }
.student-view { max-width: 1100px; margin: 0 auto; padding: 2rem; }
h1 { font-size: 2rem; margin: 0 0 0.5rem; }
.duration { color: #64748b; margin: 0 0 1.5rem; }
.instructions, .resources { background: #fff; border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 1px 3px rgba(15, 23, 42, 0.08); }
.placeholder { color: #94a3b8; font-style: italic; }
.resource { border: 1px solid #e2e8f0; border-radius: 8px; margin-top: 1rem; overflow: hidden; }
.resource-header { padding: 0.75rem 1rem; background: #f1f5f9; font-weight: 600; }
.resource-title { color: inherit; text-decoration: none; }
.resource-content img, .resource-content video { display: block; max-width: 100%; margin: 0 auto; }
.resource-content iframe { width: 100%; height: 70vh; border: 0; }
.youtube-container iframe { height: auto; aspect-ratio: 16 / 9; }
.resource-fallback { padding: 1.5rem; text-align: center; }
.resource-warning { color: #b91c1c; }
.resource-open-button { display: inline-block; padding: 0.5rem 1rem; border-radius: 6px; background: #2563eb; color: #fff; text-decoration: none; }
"#;

/// The instructions section of a student document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "text")]
pub enum Instructions {
    /// Sanitized student content
    Content(String),

    /// Nothing to show; carries the placeholder text
    Placeholder(String),
}

/// One rendered resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBlock {
    pub resource_id: String,
    pub resource_type: ResourceType,

    /// Whether the block is a fallback card rather than an embed
    pub fallback: bool,

    /// Sanitized markup of the block
    pub html: String,
}

/// A complete, self-contained student-facing document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDocument {
    /// "Student View - <lesson title>"
    pub title: String,

    /// "Activity N: <activity title>"
    pub heading: String,

    /// Index the document was built for
    pub activity_index: usize,

    /// Activity the document was built for (`None` for an empty lesson)
    pub activity_id: Option<String>,

    pub duration: Option<String>,

    pub instructions: Instructions,

    /// Visible resources of the activity, in order
    pub resources: Vec<ResourceBlock>,
}

impl StudentDocument {
    /// Build the document for one activity of a lesson.
    ///
    /// The index is clamped to the activity list; a lesson without activities
    /// yields a placeholder document.
    pub fn build(
        content: &LessonContent,
        activity_index: usize,
        embeds: &EmbedRegistry,
        options: &SanitizeOptions,
    ) -> Self {
        let title = document_title(&content.title);

        if content.activity_count() == 0 {
            return Self::empty(title);
        }

        let index = activity_index.min(content.activity_count() - 1);
        let Some(activity) = content.activity(index) else {
            return Self::empty(title);
        };

        let instructions = match activity.student_content.as_deref() {
            Some(text) if activity.show_to_students => {
                let clean = sanitize(Some(text), options);
                if clean.trim().is_empty() {
                    Instructions::Placeholder(NO_INSTRUCTIONS.to_string())
                } else {
                    Instructions::Content(clean)
                }
            }
            _ => Instructions::Placeholder(NO_INSTRUCTIONS.to_string()),
        };

        let resources = content
            .student_resources(activity)
            .map(|resource| {
                let view = embeds.render(resource);
                ResourceBlock {
                    resource_id: resource.id.clone(),
                    resource_type: classify(resource.file_url.as_deref()),
                    fallback: view.is_fallback(),
                    html: sanitize(Some(&view.to_html()), options),
                }
            })
            .collect();

        Self {
            title,
            heading: format!("Activity {}: {}", index + 1, activity.title),
            activity_index: index,
            activity_id: Some(activity.id.clone()),
            duration: activity.duration.clone().filter(|d| !d.trim().is_empty()),
            instructions,
            resources,
        }
    }

    fn empty(title: String) -> Self {
        Self {
            title,
            heading: "No activities".to_string(),
            activity_index: 0,
            activity_id: None,
            duration: None,
            instructions: Instructions::Placeholder(NO_ACTIVITIES.to_string()),
            resources: Vec::new(),
        }
    }

    /// Whether the document contains a block for the given resource
    pub fn has_resource(&self, resource_id: &str) -> bool {
        self.resources.iter().any(|b| b.resource_id == resource_id)
    }

    /// Ids of the rendered resources, in order
    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources.iter().map(|b| b.resource_id.as_str()).collect()
    }

    /// Serialize as a standalone HTML page
    pub fn to_html(&self) -> String {
        let mut body = String::new();

        body.push_str("<header>");
        body.push_str(&format!("<h1>{}</h1>", escape_html(&self.heading)));
        if let Some(duration) = &self.duration {
            body.push_str(&format!(
                r#"<p class="duration">{}</p>"#,
                escape_html(duration)
            ));
        }
        body.push_str("</header>\n");

        body.push_str(r#"<section class="instructions">"#);
        match &self.instructions {
            Instructions::Content(html) => body.push_str(html),
            Instructions::Placeholder(text) => body.push_str(&format!(
                r#"<p class="placeholder">{}</p>"#,
                escape_html(text)
            )),
        }
        body.push_str("</section>\n");

        if self.activity_id.is_some() {
            body.push_str(r#"<section class="resources"><h2>Resources</h2>"#);
            if self.resources.is_empty() {
                body.push_str(&format!(r#"<p class="placeholder">{}</p>"#, NO_RESOURCES));
            }
            for block in &self.resources {
                body.push('\n');
                body.push_str(&block.html);
            }
            body.push_str("</section>\n");
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n\
             <main class=\"student-view\">\n{}</main>\n</body>\n</html>\n",
            escape_html(&self.title),
            STYLESHEET,
            body
        )
    }

    /// Short content hash of the rendered page
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_html().as_bytes());
        let result = hasher.finalize();

        // 16 hex chars = 8 bytes
        hex::encode(&result[..8])
    }
}

fn document_title(lesson_title: &str) -> String {
    let lesson_title = lesson_title.trim();
    if lesson_title.is_empty() {
        "Student View".to_string()
    } else {
        format!("Student View - {}", lesson_title)
    }
}

/// Build the document for one activity with fresh embed state
pub fn build_document(
    content: &LessonContent,
    activity_index: usize,
    options: &SanitizeOptions,
) -> StudentDocument {
    let mut embeds = EmbedRegistry::new();
    embeds.sync_all(&content.resources);
    StudentDocument::build(content, activity_index, &embeds, options)
}
