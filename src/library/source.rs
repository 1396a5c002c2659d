//! Lesson sources.
//!
//! A source hands out complete [`LessonContent`] snapshots. The presentation
//! side never sees partial data: a fetch either returns a whole validated
//! lesson or an error, and the caller keeps its previous snapshot on error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::LessonContent;

/// Errors raised while loading a lesson
#[derive(Debug, Error)]
pub enum LessonError {
    #[error("Lesson file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid lesson YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid lesson JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid lesson: {0}")]
    Invalid(String),
}

/// Lesson file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonFormat {
    Yaml,
    Json,
}

impl LessonFormat {
    /// Guess the format from a file extension (YAML unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => LessonFormat::Json,
            _ => LessonFormat::Yaml,
        }
    }
}

/// Where lesson snapshots come from
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch a complete lesson snapshot
    async fn fetch(&self) -> Result<LessonContent, LessonError>;
}

/// Parse and validate a lesson document
pub fn parse_lesson(text: &str, format: LessonFormat) -> Result<LessonContent, LessonError> {
    let mut content: LessonContent = match format {
        LessonFormat::Yaml => serde_yaml::from_str(text)?,
        LessonFormat::Json => serde_json::from_str(text)?,
    };

    validate(&content)?;
    content.sort();
    Ok(content)
}

fn validate(content: &LessonContent) -> Result<(), LessonError> {
    let mut activity_ids = HashSet::new();
    for activity in &content.activities {
        if activity.id.trim().is_empty() {
            return Err(LessonError::Invalid(format!(
                "activity '{}' has no id",
                activity.title
            )));
        }
        if !activity_ids.insert(activity.id.as_str()) {
            return Err(LessonError::Invalid(format!(
                "duplicate activity id '{}'",
                activity.id
            )));
        }
    }

    let mut resource_ids = HashSet::new();
    for resource in &content.resources {
        if !resource_ids.insert(resource.id.as_str()) {
            return Err(LessonError::Invalid(format!(
                "duplicate resource id '{}'",
                resource.id
            )));
        }
    }

    Ok(())
}

/// Lesson stored as a YAML or JSON file
#[derive(Debug, Clone)]
pub struct FileLessonSource {
    path: PathBuf,
    format: LessonFormat,
    name: String,
}

impl FileLessonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = LessonFormat::from_path(&path);
        let name = format!("file:{}", path.display());
        Self { path, format, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LessonSource for FileLessonSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<LessonContent, LessonError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LessonError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let content = parse_lesson(&text, self.format)?;
        debug!(
            activities = content.activity_count(),
            resources = content.resources.len(),
            "Lesson loaded"
        );
        Ok(content)
    }
}

/// Lesson held in memory; `set` swaps the snapshot the next fetch returns
#[derive(Debug, Default)]
pub struct MemoryLessonSource {
    content: RwLock<LessonContent>,
}

impl MemoryLessonSource {
    pub fn new(content: LessonContent) -> Self {
        Self {
            content: RwLock::new(content),
        }
    }

    pub async fn set(&self, content: LessonContent) {
        *self.content.write().await = content;
    }
}

#[async_trait]
impl LessonSource for MemoryLessonSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self) -> Result<LessonContent, LessonError> {
        let mut content = self.content.read().await.clone();
        validate(&content)?;
        content.sort();
        Ok(content)
    }
}
