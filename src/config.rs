//! Configuration management for comment-wrapper
//!
//! This module defines the configuration file format, its discovery and loading
//! logic, and the [`Contributions`] cache the reflow engine reads its line
//! width from.
//!
//! Configuration is TOML:
//!
//! ```toml
//! line-width = 80
//! extension-dirs = ["~/.vscode/extensions"]
//! exclude = ["target/**"]
//!
//! [languages]
//! "h" = "c"
//! ```

use crate::languages::{default_extension_dirs, expand_home};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Line width used when nothing is configured
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Smallest line width the engine will work with
pub const MIN_LINE_WIDTH: usize = 1;

/// Configuration file names, in order of precedence
pub const CONFIG_FILES: &[&str] = &[".comment-wrapper.toml", "comment-wrapper.toml"];

/// Represents the complete configuration loaded from comment-wrapper.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(default, rename_all = "kebab-case")]
#[schemars(description = "comment-wrapper configuration for reflowing single-line comments.")]
pub struct Config {
    /// Target maximum column count for a comment line (default: 80)
    #[serde(alias = "line_width", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<i64>,

    /// Directories holding editor extensions with language definitions.
    /// A leading `~` expands to the home directory. When empty, the
    /// extension directories of common VS Code installations are used.
    #[serde(alias = "extension_dirs")]
    pub extension_dirs: Vec<String>,

    /// Glob patterns of files to skip when walking directories
    pub exclude: Vec<String>,

    /// File extension (without dot) to language id overrides, e.g. `h = "c"`
    pub languages: BTreeMap<String, String>,
}

impl Config {
    /// Extension directories to scan, with `~` expanded.
    pub fn resolved_extension_dirs(&self) -> Vec<PathBuf> {
        if self.extension_dirs.is_empty() {
            return default_extension_dirs();
        }
        self.extension_dirs.iter().map(|dir| expand_home(dir)).collect()
    }

    /// Compile the exclude patterns. Invalid patterns are skipped with a warning.
    pub fn exclude_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => log::warn!("Invalid glob pattern in exclude: {pattern}: {e}"),
            }
        }
        builder.build().unwrap_or_else(|e| {
            log::error!("Failed to build globset for exclude: {e}");
            GlobSet::empty()
        })
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Configuration file already exists
    #[error("Configuration file already exists at {path}")]
    FileExists { path: String },
}

/// A configuration together with the file it was loaded from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
}

/// Parse the content of a configuration file.
pub fn parse_config(content: &str, path: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("{path}: Failed to parse TOML: {e}")))
}

/// Read and parse a configuration file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        source: e,
        path: path_str.clone(),
    })?;
    parse_config(&content, &path_str)
}

/// Discover a configuration file by walking up from `start_dir`.
///
/// The search stops after the directory holding `.git`.
pub fn discover_config_upward(start_dir: &Path) -> Option<PathBuf> {
    const MAX_DEPTH: usize = 100;

    let mut current_dir = start_dir.to_path_buf();
    for _ in 0..MAX_DEPTH {
        log::debug!("[config] Searching for config in: {}", current_dir.display());

        for config_name in CONFIG_FILES {
            let config_path = current_dir.join(config_name);
            if config_path.is_file() {
                log::debug!("[config] Found config file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if current_dir.join(".git").exists() {
            log::debug!("[config] Stopping at .git directory");
            return None;
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                log::debug!("[config] Reached filesystem root");
                return None;
            }
        }
    }

    log::debug!("[config] Maximum traversal depth reached");
    None
}

/// Find a configuration file inside `<config_dir>/comment-wrapper/`.
fn user_configuration_path_impl(config_dir: &Path) -> Option<PathBuf> {
    let config_dir = config_dir.join("comment-wrapper");
    CONFIG_FILES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|path| path.is_file())
}

/// Discover user-level configuration in the platform config directory.
fn user_configuration_path() -> Option<PathBuf> {
    use etcetera::{BaseStrategy, choose_base_strategy};

    match choose_base_strategy() {
        Ok(strategy) => user_configuration_path_impl(&strategy.config_dir()),
        Err(e) => {
            log::debug!("[config] Failed to determine user config directory: {e}");
            None
        }
    }
}

/// Locates and loads configuration.
///
/// Precedence: an explicit path, then the nearest project file found walking
/// up from `start_dir`, then the user configuration directory. With
/// `skip_auto_discovery` only an explicit path is considered.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    pub config_path: Option<PathBuf>,
    pub skip_auto_discovery: bool,
    pub start_dir: Option<PathBuf>,
    pub user_config_dir: Option<PathBuf>,
    /// Command-line line width, which wins over any file
    pub line_width_override: Option<i64>,
}

impl ConfigLoader {
    pub fn new(config_path: Option<PathBuf>, skip_auto_discovery: bool) -> Self {
        Self {
            config_path,
            skip_auto_discovery,
            ..Default::default()
        }
    }

    pub fn with_line_width(mut self, line_width: Option<i64>) -> Self {
        self.line_width_override = line_width;
        self
    }

    /// Path of the configuration file that [`load`](Self::load) would read.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            log::debug!("[config] Explicit config_path provided: {}", path.display());
            return Some(path.clone());
        }
        if self.skip_auto_discovery {
            log::debug!("[config] Skipping auto-discovery due to --no-config flag");
            return None;
        }

        let start_dir = match &self.start_dir {
            Some(dir) => Some(dir.clone()),
            None => std::env::current_dir()
                .inspect_err(|e| log::debug!("[config] Failed to get current directory: {e}"))
                .ok(),
        };
        if let Some(found) = start_dir.as_deref().and_then(discover_config_upward) {
            return Some(found);
        }

        match &self.user_config_dir {
            Some(dir) => user_configuration_path_impl(dir),
            None => user_configuration_path(),
        }
    }

    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let Some(path) = self.locate() else {
            log::debug!("[config] No configuration file found, using defaults");
            return Ok(LoadedConfig {
                config: self.apply_overrides(Config::default()),
                path: None,
            });
        };

        let config = load_config_file(&path)?;
        Ok(LoadedConfig {
            config: self.apply_overrides(config),
            path: Some(path),
        })
    }

    fn apply_overrides(&self, mut config: Config) -> Config {
        if self.line_width_override.is_some() {
            config.line_width = self.line_width_override;
        }
        config
    }
}

/// Source of the contributed line width setting.
pub trait SettingsProvider {
    /// Raw configured line width, or `None` when unset or unreadable.
    fn line_width(&self) -> Option<i64>;
}

impl SettingsProvider for Config {
    fn line_width(&self) -> Option<i64> {
        self.line_width
    }
}

impl SettingsProvider for ConfigLoader {
    fn line_width(&self) -> Option<i64> {
        match self.load() {
            Ok(loaded) => loaded.config.line_width,
            Err(e) => {
                log::warn!("{e}");
                self.line_width_override
            }
        }
    }
}

/// Fixed line width, mostly useful in tests and for stdin input.
#[derive(Debug, Clone, Copy)]
pub struct FixedLineWidth(pub i64);

impl SettingsProvider for FixedLineWidth {
    fn line_width(&self) -> Option<i64> {
        Some(self.0)
    }
}

/// Cached settings read from a [`SettingsProvider`] until the next reload.
pub struct Contributions {
    provider: Box<dyn SettingsProvider>,
    line_width: usize,
}

impl Contributions {
    pub fn new(provider: Box<dyn SettingsProvider>) -> Self {
        let line_width = sanitize_line_width(provider.line_width());
        Self { provider, line_width }
    }

    /// Re-read every setting from the provider.
    pub fn reload(&mut self) {
        self.line_width = sanitize_line_width(self.provider.line_width());
        log::debug!("[config] Reloaded line width: {}", self.line_width);
    }

    pub fn line_width(&self) -> usize {
        self.line_width
    }
}

impl std::fmt::Debug for Contributions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contributions")
            .field("line_width", &self.line_width)
            .finish_non_exhaustive()
    }
}

/// Clamp a raw line width to something the engine can work with.
pub fn sanitize_line_width(raw: Option<i64>) -> usize {
    match raw {
        None => DEFAULT_LINE_WIDTH,
        Some(width) if width < MIN_LINE_WIDTH as i64 => {
            log::warn!("line-width must be positive, got {width}; using {MIN_LINE_WIDTH}");
            MIN_LINE_WIDTH
        }
        Some(width) => usize::try_from(width).unwrap_or(usize::MAX),
    }
}

/// Default configuration file content
pub fn default_config_content() -> String {
    format!(
        r#"# comment-wrapper configuration

# Target maximum column count for comment lines
line-width = {DEFAULT_LINE_WIDTH}

# Directories holding editor extensions with language definitions.
# When empty, the extension directories of common VS Code installations are used.
extension-dirs = []

# Glob patterns of files to skip
exclude = []

# File extension to language id overrides
[languages]
"#
    )
}

/// Create a default configuration file at the specified path
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let path_str = path.display().to_string();
    if path.exists() {
        return Err(ConfigError::FileExists { path: path_str });
    }
    fs::write(path, default_config_content()).map_err(|e| ConfigError::IoError {
        source: e,
        path: path_str,
    })
}
