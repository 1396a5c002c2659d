//! External link openers.
//!
//! `SystemOpener` hands URLs to the platform's default handler
//! (`xdg-open`, `open`, or `rundll32 url.dll,FileProtocolHandler`). The
//! caller never waits; the child is reaped in the background.

use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use super::ExternalOpener;

/// Errors raised while opening a URL
#[derive(Debug, Error)]
pub enum OpenerError {
    #[error("Refusing to open URL with unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Failed to spawn opener '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Schemes handed to the platform opener
const OPENABLE_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Opener backed by the platform's URL handler
#[derive(Debug, Clone)]
pub struct SystemOpener {
    /// Override for the opener binary (e.g. "firefox")
    command: Option<String>,
}

impl Default for SystemOpener {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SystemOpener {
    /// Create an opener, optionally overriding the platform default command
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }

    fn build_command(&self, url: &str) -> (String, Command) {
        let no_args: &[&str] = &[];
        let (program, leading) = match &self.command {
            Some(custom) => (custom.as_str(), no_args),
            None => platform_opener(std::env::consts::OS),
        };

        let mut cmd = Command::new(program);
        cmd.args(leading).arg(url);
        (program.to_string(), cmd)
    }

    /// Spawn the opener for `url` and return the child's pid
    fn spawn_detached(&self, url: &str) -> Result<u32, OpenerError> {
        let (name, mut cmd) = self.build_command(url);
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OpenerError::Spawn {
                command: name.clone(),
                source,
            })?;

        let pid = child.id();
        reap_in_background(child, name);
        Ok(pid)
    }
}

/// Program and leading arguments of the default opener for an OS.
///
/// The URL is always passed as a separate argument to a program that does
/// not run it through a shell, so `&` and friends stay part of the URL.
fn platform_opener(os: &str) -> (&'static str, &'static [&'static str]) {
    match os {
        "macos" => ("open", &[]),
        "windows" => ("rundll32", &["url.dll,FileProtocolHandler"]),
        _ => ("xdg-open", &[]),
    }
}

/// Wait on the child off the calling thread so it does not linger as a zombie
fn reap_in_background(mut child: Child, name: String) {
    let wait = move || match child.wait() {
        Ok(status) if !status.success() => {
            warn!(opener = %name, %status, "External opener exited with failure")
        }
        Ok(_) => {}
        Err(e) => warn!(opener = %name, error = %e, "Failed to wait for external opener"),
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(wait);
        }
        Err(_) => {
            std::thread::spawn(wait);
        }
    }
}

impl ExternalOpener for SystemOpener {
    fn open_url(&self, url: &str) -> Result<(), OpenerError> {
        let lower = url.trim().to_lowercase();
        if !OPENABLE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
            return Err(OpenerError::UnsupportedScheme(url.to_string()));
        }

        let pid = self.spawn_detached(url.trim())?;
        debug!(pid, url = %url, "Spawned external opener");
        Ok(())
    }
}

/// Opener that only records the URLs it was asked to open
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ExternalOpener for RecordingOpener {
    fn open_url(&self, url: &str) -> Result<(), OpenerError> {
        let mut opened = self
            .opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        opened.push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_opener_rejects_script_urls() {
        let opener = SystemOpener::new(Some("true".to_string()));
        let err = opener.open_url("javascript:alert(1)").unwrap_err();
        assert!(matches!(err, OpenerError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_system_opener_reports_missing_binary() {
        let opener = SystemOpener::new(Some("/nonexistent/classcast-opener".to_string()));
        let err = opener.open_url("https://example.com").unwrap_err();
        assert!(matches!(err, OpenerError::Spawn { .. }));
    }

    #[test]
    fn test_platform_opener_never_uses_a_shell() {
        for os in ["windows", "macos", "linux", "freebsd"] {
            let (program, leading) = platform_opener(os);
            assert_ne!(program, "cmd");
            assert!(!leading.contains(&"/C"));
        }
        assert_eq!(
            platform_opener("windows"),
            ("rundll32", &["url.dll,FileProtocolHandler"][..])
        );
    }

    #[test]
    fn test_url_with_ampersand_is_a_single_argument() {
        let url = "https://www.youtube.com/watch?v=ID&t=42";
        let (_, cmd) = SystemOpener::default().build_command(url);
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args.last().copied(), Some(std::ffi::OsStr::new(url)));
    }

    /// Whether the process is gone from the process table (not even a zombie)
    #[cfg(target_os = "linux")]
    fn is_reaped(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{}/stat", pid)).is_err()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_opener_child_is_reaped_without_runtime() {
        let opener = SystemOpener::new(Some("true".to_string()));
        let pid = opener.spawn_detached("https://example.com").unwrap();

        let mut reaped = false;
        for _ in 0..100 {
            if is_reaped(pid) {
                reaped = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(reaped, "opener process {} left behind", pid);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_opener_child_is_reaped_inside_runtime() {
        let opener = SystemOpener::new(Some("true".to_string()));
        let pid = opener.spawn_detached("https://example.com").unwrap();

        let mut reaped = false;
        for _ in 0..100 {
            if is_reaped(pid) {
                reaped = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(reaped, "opener process {} left behind", pid);
    }

    #[test]
    fn test_recording_opener_keeps_order() {
        let opener = RecordingOpener::new();
        opener.open_url("https://a.example").unwrap();
        opener.open_url("https://b.example").unwrap();
        assert_eq!(opener.opened(), vec!["https://a.example", "https://b.example"]);
    }
}
