use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::format_spec::MAX_DUP_COUNT;
use crate::generator::GenerateOptions;
use crate::model::DEFAULT_MAX_DEPTH;

/// Directory holding the config file, relative to the working directory.
pub const CONFIG_DIR: &str = ".seqren";

const OPERATION_LOG_FILE: &str = "operations.log";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub undo: UndoConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Rename pattern used when none is given
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Counter for the first file
    #[serde(default = "default_start")]
    pub start: u32,

    /// Keep destinations distinct with the `_(n)` decorator
    #[serde(default = "default_true")]
    pub unique: bool,

    /// Treat files outside the batch as collisions
    #[serde(default = "default_true")]
    pub check_existing: bool,

    #[serde(default = "default_max_dup_count")]
    pub max_dup_count: u32,

    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            start: default_start(),
            unique: true,
            check_existing: true,
            max_dup_count: default_max_dup_count(),
            use_color: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Overrides the log next to the executable
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Write the operation log to `.seqren/operations.log` unless
    /// `operation_log` names another file
    #[serde(default)]
    pub enabled: bool,

    /// Append-only log of every file operation
    #[serde(default)]
    pub operation_log: Option<PathBuf>,
}

impl LogConfig {
    /// Where operations are logged, if anywhere. Relative paths resolve
    /// against the working directory.
    pub fn operation_log_path(&self) -> Option<PathBuf> {
        self.operation_log
            .clone()
            .or_else(|| self.enabled.then(|| Path::new(CONFIG_DIR).join(OPERATION_LOG_FILE)))
    }
}

fn default_pattern() -> String {
    "*_###".to_string()
}

fn default_start() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_max_dup_count() -> u32 {
    MAX_DUP_COUNT
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Config {
    /// Load config from .seqren/config.toml if it exists
    pub fn load() -> Result<Self> {
        if let Ok(cwd) = std::env::current_dir() {
            let config_path = cwd.join(CONFIG_DIR).join("config.toml");
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Generator options from the configured defaults.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            start: self.defaults.start,
            unique: self.defaults.unique,
            check_existing: self.defaults.check_existing,
            max_dup_count: self.defaults.max_dup_count,
            ..GenerateOptions::default()
        }
    }
}
