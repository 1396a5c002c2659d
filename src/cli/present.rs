//! Interactive presentation session.
//!
//! Reads one command per line from stdin and drives a
//! [`PresentationController`] over a [`FileSurface`]. Edits to the lesson
//! file are picked up by the watcher, re-fetched, and pushed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::adapters::{FileSurface, SecondarySurface, SystemOpener};
use crate::config;
use crate::core::{Direction, FocusContext, Key, PresentationController};
use crate::ingest::LessonWatcher;
use crate::library::{FileLessonSource, LessonSource};

const HELP: &str = "\
Commands:
  n, next          next activity
  p, prev          previous activity
  g <N>            go to activity N
  left, right      arrow keys
  o, open          open the student display
  c, close         close the student display
  r, refresh       push the current activity again
  loaded <id>      report an embed as loaded
  fail <id> [msg]  report an embed as failed
  x <id>           open a resource externally
  s, status        show the current state
  log              dump the event log as JSON
  h, help          show this help
  q, quit          leave presentation mode";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Next,
    Previous,
    Go(usize),
    Key(Key),
    Open,
    Close,
    Refresh,
    Loaded(String),
    Failed(String, Option<String>),
    OpenExternal(String),
    Status,
    Log,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse a command line. Returns an error message for bad input and
    /// `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next();

        let command = match verb.to_lowercase().as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" | "previous" => Self::Previous,
            "left" => Self::Key(Key::ArrowLeft),
            "right" => Self::Key(Key::ArrowRight),
            "g" | "go" => {
                let n: usize = arg
                    .ok_or("usage: g <N>")?
                    .parse()
                    .map_err(|_| "activity number must be a positive integer".to_string())?;
                if n == 0 {
                    return Err("activities are numbered from 1".to_string());
                }
                Self::Go(n - 1)
            }
            "o" | "open" => Self::Open,
            "c" | "close" => Self::Close,
            "r" | "refresh" => Self::Refresh,
            "loaded" => Self::Loaded(arg.ok_or("usage: loaded <id>")?.to_string()),
            "fail" => {
                let id = arg.ok_or("usage: fail <id> [message]")?.to_string();
                let message: Vec<&str> = parts.collect();
                let message = if message.is_empty() {
                    None
                } else {
                    Some(message.join(" "))
                };
                Self::Failed(id, message)
            }
            "x" | "external" => Self::OpenExternal(arg.ok_or("usage: x <id>")?.to_string()),
            "s" | "status" => Self::Status,
            "log" => Self::Log,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{}' (h for help)", other)),
        };

        Ok(Some(command))
    }
}

/// Apply a command. Returns false when the session should end.
pub fn apply_command<S: SecondarySurface>(
    controller: &mut PresentationController<S>,
    command: SessionCommand,
    opener: &SystemOpener,
) -> Result<bool> {
    match command {
        SessionCommand::Next => {
            controller.navigate(Direction::Next);
        }
        SessionCommand::Previous => {
            controller.navigate(Direction::Previous);
        }
        SessionCommand::Go(index) => {
            if index >= controller.content().activity_count() {
                eprintln!("No activity {}", index + 1);
            }
            controller.select(index);
        }
        SessionCommand::Key(key) => {
            controller.handle_key(key, FocusContext::Page);
        }
        SessionCommand::Open => {
            if !controller.open() {
                eprintln!("Student display could not be opened");
            }
        }
        SessionCommand::Close => controller.close(),
        SessionCommand::Refresh => {
            if !controller.refresh() {
                eprintln!("Student display is closed");
            }
        }
        SessionCommand::Loaded(id) => {
            controller.report_embed_loaded(&id);
        }
        SessionCommand::Failed(id, message) => {
            if !controller.report_embed_failed(&id, message) {
                eprintln!("No change for resource '{}'", id);
            }
        }
        SessionCommand::OpenExternal(id) => {
            if !controller.open_resource_externally(&id, opener) {
                eprintln!("Could not open resource '{}'", id);
            }
        }
        SessionCommand::Status => {}
        SessionCommand::Log => {
            let json = serde_json::to_string_pretty(controller.events())
                .context("Failed to serialize event log")?;
            println!("{}", json);
            return Ok(true);
        }
        SessionCommand::Help => {
            println!("{}", HELP);
            return Ok(true);
        }
        SessionCommand::Quit => return Ok(false),
    }

    print_status(controller);
    Ok(true)
}

/// One-line summary of where the presentation is
pub fn status_line<S: SecondarySurface>(controller: &PresentationController<S>) -> String {
    let count = controller.content().activity_count();
    let surface = if controller.is_open() { "open" } else { "closed" };

    match controller.current_activity() {
        Some(activity) => format!(
            "[{}/{}] {} (student display {})",
            controller.current_index() + 1,
            count,
            activity.title,
            surface
        ),
        None => format!("[0/0] no activities (student display {})", surface),
    }
}

fn print_status<S: SecondarySurface>(controller: &PresentationController<S>) {
    println!("{}", status_line(controller));
}

/// Run an interactive session until `q` or end of input
pub async fn execute_present(
    lesson: PathBuf,
    output: Option<PathBuf>,
    open_on_start: bool,
) -> Result<()> {
    let cfg = config::config()?;

    let source = FileLessonSource::new(&lesson);
    let content = source
        .fetch()
        .await
        .with_context(|| format!("Failed to load lesson: {}", lesson.display()))?;

    let output = output.unwrap_or_else(|| cfg.output.clone());
    let surface = FileSurface::new(&output);
    let opener = SystemOpener::new(cfg.opener_command.clone());

    let mut controller = PresentationController::new(content, surface)
        .with_sanitize_options(cfg.sanitizer.clone())
        .with_keyboard_scope(cfg.keyboard_scope);

    let (mut changes, watch_handle) = LessonWatcher::new(&lesson)
        .watch()
        .with_context(|| format!("Failed to watch lesson: {}", lesson.display()))?;

    tracing::info!(
        "Presenting '{}' ({} activities), student display at {}",
        controller.content().title,
        controller.content().activity_count(),
        output.display()
    );

    if open_on_start && !controller.open() {
        eprintln!("Student display could not be opened; use 'o' to retry");
    }
    print_status(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };

                match SessionCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if !apply_command(&mut controller, command, &opener)? {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{}", message),
                }
            }
            Some(change) = changes.recv() => {
                tracing::debug!("Reloading lesson after change {}", change.hash);
                match controller.reload_from(&source).await {
                    Ok(()) => print_status(&controller),
                    Err(e) => tracing::warn!("Keeping previous lesson content: {}", e),
                }
            }
        }
    }

    controller.close();
    watch_handle.stop().await?;

    Ok(())
}
