//! Command-line interface for classcast.
//!
//! Provides commands for classifying resource URLs, sanitizing markup,
//! rendering a single student document, and running an interactive
//! presentation session.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::core::{
    build_document, classify, extract_youtube_id, google_docs_preview_url, sanitize,
    ResourceType,
};
use crate::library::{FileLessonSource, LessonSource};

pub mod present;

/// classcast - Lesson resource classification and student display sync
#[derive(Parser, Debug)]
#[command(name = "classcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify resource URLs
    Classify {
        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Sanitize rich-text markup
    Sanitize {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Drop iframe embeds
        #[arg(long)]
        no_embeds: bool,
    },

    /// Write the student document for one activity
    Render {
        /// Lesson file (YAML or JSON)
        lesson: PathBuf,

        /// Activity number, starting at 1
        #[arg(short, long, default_value = "1")]
        activity: usize,

        /// Output file (prints to stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Present a lesson interactively
    Present {
        /// Lesson file (YAML or JSON)
        lesson: PathBuf,

        /// Student document path (defaults to the configured output)
        #[arg(short, long, env = "CLASSCAST_OUTPUT")]
        output: Option<PathBuf>,

        /// Do not open the student surface on start
        #[arg(long)]
        no_open: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Classify { urls } => classify_urls(&urls),
            Commands::Sanitize { input, no_embeds } => sanitize_input(input, no_embeds),
            Commands::Render {
                lesson,
                activity,
                output,
            } => render_lesson(lesson, activity, output).await,
            Commands::Present {
                lesson,
                output,
                no_open,
            } => present::execute_present(lesson, output, !no_open).await,
            Commands::Config => show_config(),
        }
    }
}

/// Print the resource type (and derived embed data) for each URL
fn classify_urls(urls: &[String]) -> Result<()> {
    for url in urls {
        let resource_type = classify(Some(url.as_str()));
        println!("{:<12} {}", resource_type.as_str(), url);

        match resource_type {
            ResourceType::YouTube => match extract_youtube_id(url) {
                Some(id) => println!("{:<12} youtube id: {}", "", id),
                None => println!("{:<12} youtube id: (invalid)", ""),
            },
            ResourceType::GoogleDoc => {
                if let Some(preview) = google_docs_preview_url(url) {
                    println!("{:<12} preview: {}", "", preview);
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Sanitize a file or stdin to stdout
fn sanitize_input(input_file: Option<PathBuf>, no_embeds: bool) -> Result<()> {
    let input = if let Some(path) = input_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    };

    let mut options = config::config()?.sanitizer.clone();
    if no_embeds {
        options.allow_embeds = false;
    }

    println!("{}", sanitize(Some(&input), &options));
    Ok(())
}

/// Write one student document
async fn render_lesson(lesson: PathBuf, activity: usize, output: Option<PathBuf>) -> Result<()> {
    let source = FileLessonSource::new(&lesson);
    let content = source
        .fetch()
        .await
        .with_context(|| format!("Failed to load lesson: {}", lesson.display()))?;

    let count = content.activity_count();
    if count > 0 && (activity == 0 || activity > count) {
        anyhow::bail!(
            "Activity {} does not exist (lesson has {} activities)",
            activity,
            count
        );
    }

    let options = &config::config()?.sanitizer;
    let document = build_document(&content, activity.saturating_sub(1), options);
    let html = document.to_html();

    match output {
        Some(path) => {
            std::fs::write(&path, &html)
                .with_context(|| format!("Failed to write document: {}", path.display()))?;
            eprintln!(
                "[{} -> {} ({})]",
                document.heading,
                path.display(),
                document.fingerprint()
            );
        }
        None => print!("{}", html),
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("classcast configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:            {}", cfg.home.display());
    println!("  Student output:  {}", cfg.output.display());
    println!();
    println!("Keyboard scope:    {:?}", cfg.keyboard_scope);
    println!(
        "Opener:            {}",
        cfg.opener_command.as_deref().unwrap_or("(platform default)")
    );
    println!();
    println!("Sanitizer:");
    println!("{}", serde_yaml::to_string(&cfg.sanitizer)?);

    Ok(())
}
