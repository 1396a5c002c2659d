//! Lesson file watcher.
//!
//! Watches the directory holding a lesson file and emits an event when the
//! file's content actually changed. The directory is watched rather than the
//! file itself because editors often save by writing a new file and renaming
//! it over the old one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::new_debouncer;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Lesson directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Lesson path has no file name: {0}")]
    NotAFile(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Lesson file to watch
    pub lesson_path: PathBuf,

    /// Debounce window for bursts of file events (milliseconds)
    pub debounce_ms: u64,
}

impl WatcherConfig {
    pub fn new(lesson_path: impl Into<PathBuf>) -> Self {
        Self {
            lesson_path: lesson_path.into(),
            debounce_ms: 300,
        }
    }

    /// Directory that is actually watched
    pub fn watch_dir(&self) -> PathBuf {
        match self.lesson_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Check the lesson path can be watched
    pub fn validate(&self) -> Result<(), WatcherError> {
        if self.lesson_path.file_name().is_none() {
            return Err(WatcherError::NotAFile(self.lesson_path.clone()));
        }
        let dir = self.watch_dir();
        if !dir.is_dir() {
            return Err(WatcherError::DirectoryNotFound(dir));
        }
        Ok(())
    }
}

/// Emitted when the lesson file changed on disk
#[derive(Debug, Clone)]
pub struct LessonChanged {
    /// Path of the lesson file
    pub path: PathBuf,

    /// SHA256 of the new content (12 chars)
    pub hash: String,

    /// When the change was detected
    pub detected_at: DateTime<Utc>,
}

/// Watches one lesson file for content changes
pub struct LessonWatcher {
    config: WatcherConfig,
}

impl LessonWatcher {
    pub fn new(lesson_path: impl Into<PathBuf>) -> Self {
        Self {
            config: WatcherConfig::new(lesson_path),
        }
    }

    pub fn with_config(config: WatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Start watching. Change events arrive on the returned channel until
    /// the handle is stopped.
    pub fn watch(&self) -> Result<(mpsc::Receiver<LessonChanged>, WatchHandle), WatcherError> {
        self.config.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<LessonChanged>(16);
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        // Set up the debouncer here so setup errors reach the caller
        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(Duration::from_millis(self.config.debounce_ms), tx)?;
        debouncer
            .watcher()
            .watch(&self.config.watch_dir(), RecursiveMode::NonRecursive)?;

        let config = self.config.clone();
        let task = tokio::task::spawn_blocking(move || {
            // Keep the debouncer alive for the lifetime of the loop
            let _debouncer = debouncer;
            run_watcher(config, rx, event_tx, stop_rx);
        });

        tracing::info!(
            "Watching {} for lesson changes",
            self.config.lesson_path.display()
        );

        Ok((event_rx, WatchHandle { stop_tx, task }))
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Whether a file event concerns the lesson file
pub fn is_lesson_event(event_path: &Path, lesson_path: &Path) -> bool {
    match (event_path.file_name(), lesson_path.file_name()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Short content hash of a file, `None` if it cannot be read
pub fn content_hash(path: &Path) -> Option<String> {
    let content = std::fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let result = hasher.finalize();

    // First 12 hex characters
    Some(format!("{:x}", result)[..12].to_string())
}

type DebounceResult = notify_debouncer_mini::DebounceEventResult;

fn run_watcher(
    config: WatcherConfig,
    rx: std::sync::mpsc::Receiver<DebounceResult>,
    event_tx: mpsc::Sender<LessonChanged>,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let mut last_hash = content_hash(&config.lesson_path);

    loop {
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Lesson watcher stopping...");
            break;
        }

        let touched = match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(Ok(events)) => events
                .iter()
                .any(|event| is_lesson_event(&event.path, &config.lesson_path)),
            Ok(Err(e)) => {
                tracing::warn!("Watcher error: {:?}", e);
                false
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Watcher channel disconnected");
                break;
            }
        };

        if !touched {
            continue;
        }

        // A delete or a partial save leaves nothing readable; wait for the next event
        let Some(hash) = content_hash(&config.lesson_path) else {
            tracing::debug!("Lesson file unreadable, waiting");
            continue;
        };

        if last_hash.as_deref() == Some(hash.as_str()) {
            tracing::debug!("Lesson file touched without content change");
            continue;
        }
        last_hash = Some(hash.clone());

        let event = LessonChanged {
            path: config.lesson_path.clone(),
            hash,
            detected_at: Utc::now(),
        };
        tracing::info!("Lesson file changed: {} ({})", event.path.display(), event.hash);

        if event_tx.blocking_send(event).is_err() {
            // Receiver dropped; nobody is listening any more
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_lesson_event() {
        let lesson = Path::new("lessons/fractions.yaml");
        assert!(is_lesson_event(Path::new("/abs/lessons/fractions.yaml"), lesson));
        assert!(!is_lesson_event(Path::new("/abs/lessons/.fractions.yaml.swp"), lesson));
        assert!(!is_lesson_event(Path::new("/"), lesson));
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lesson.yaml");

        assert!(content_hash(&path).is_none());

        std::fs::write(&path, "title: A").unwrap();
        let first = content_hash(&path).unwrap();
        assert_eq!(first.len(), 12);

        std::fs::write(&path, "title: A").unwrap();
        assert_eq!(content_hash(&path).unwrap(), first);

        std::fs::write(&path, "title: B").unwrap();
        assert_ne!(content_hash(&path).unwrap(), first);
    }

    #[test]
    fn test_validate() {
        let temp = TempDir::new().unwrap();
        let ok = WatcherConfig::new(temp.path().join("lesson.yaml"));
        assert!(ok.validate().is_ok());

        let missing = WatcherConfig::new(temp.path().join("nope").join("lesson.yaml"));
        assert!(matches!(
            missing.validate(),
            Err(WatcherError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_bare_file_name_watches_current_dir() {
        let config = WatcherConfig::new("lesson.yaml");
        assert_eq!(config.watch_dir(), PathBuf::from("."));
    }
}
