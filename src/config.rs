//! Configuration for classcast.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CLASSCAST_HOME, CLASSCAST_OUTPUT)
//! 2. Config file (.classcast/config.yaml)
//! 3. Defaults (~/.classcast)
//!
//! Config file discovery:
//! - Searches current directory and parents for .classcast/config.yaml
//! - Relative paths in the config file are resolved against the project
//!   root (the directory holding `.classcast/`)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::present::KeyboardScope;
use crate::core::sanitize::SanitizeOptions;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".classcast";
const DEFAULT_OUTPUT_FILE: &str = "student-view.html";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub sanitizer: SanitizeOptions,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub opener: OpenerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurfaceConfig {
    /// Student document path (relative to the project root)
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyboardConfig {
    #[serde(default)]
    pub scope: KeyboardScope,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenerConfig {
    /// Replaces the platform URL opener
    pub command: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// classcast home directory
    pub home: PathBuf,
    /// Where the student document is written
    pub output: PathBuf,
    /// Sanitizer allow-list tweaks
    pub sanitizer: SanitizeOptions,
    /// When arrow keys navigate
    pub keyboard_scope: KeyboardScope,
    /// Custom URL opener
    pub opener_command: Option<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to a base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Environment overrides, read once per load
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<String>,
    output: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("CLASSCAST_HOME").ok(),
            output: std::env::var("CLASSCAST_OUTPUT").ok(),
        }
    }
}

/// Combine the config file, environment and defaults
fn resolve(
    config_file: Option<(PathBuf, ConfigFile)>,
    env: EnvOverrides,
    default_home: PathBuf,
) -> ResolvedConfig {
    let (config_path, file) = match config_file {
        Some((path, file)) => (Some(path), file),
        None => (None, ConfigFile::default()),
    };

    // Project root is the parent of .classcast/
    let base_dir = config_path
        .as_deref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let home = if let Some(env_home) = env.home {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = file.home {
        resolve_path(&base_dir, home_path)
    } else {
        default_home
    };

    let output = if let Some(env_output) = env.output {
        PathBuf::from(env_output)
    } else if let Some(ref out) = file.surface.output {
        resolve_path(&base_dir, out)
    } else {
        home.join(DEFAULT_OUTPUT_FILE)
    };

    ResolvedConfig {
        home,
        output,
        sanitizer: file.sanitizer,
        keyboard_scope: file.keyboard.scope,
        opener_command: file.opener.command.filter(|c| !c.trim().is_empty()),
        config_file: config_path,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = match find_config_file(&cwd) {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    Ok(resolve(config_file, EnvOverrides::from_env(), default_home))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the classcast home directory
pub fn classcast_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the default student document path
pub fn output_path() -> Result<PathBuf> {
    Ok(config()?.output.clone())
}
