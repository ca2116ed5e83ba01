//! Configuration loading and management.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. The first config file found: `TREEFLOW_CONFIG_PATH`,
//!    `./.treeflow/config.yaml`, then `~/.treeflow/config.yaml`
//! 3. Environment variables `TREEFLOW_DATA_DIR` and `TREEFLOW_LOG_LEVEL`
//!
//! CLI flags are applied on top by the binary.

use crate::format::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "TREEFLOW_CONFIG_PATH";
pub const DATA_DIR_ENV: &str = "TREEFLOW_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "TREEFLOW_LOG_LEVEL";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the registry and preferences are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per storage key.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("treeflow"))
        .unwrap_or_else(|| PathBuf::from(".treeflow"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Default search locations, in order.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".treeflow/config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".treeflow").join("config.yaml"));
        }
        paths
    }

    /// Resolve configuration from files and the process environment.
    ///
    /// An explicit path (argument or `TREEFLOW_CONFIG_PATH`) must load; the
    /// default locations are skipped when absent.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None => Self::candidate_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(|p| {
                    debug!(path = %p.display(), "Loading config");
                    Self::load(&p)
                })
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {}",
                self.storage.data_dir.display()
            )
        })?;
        Ok(())
    }
}
