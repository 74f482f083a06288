//! Configuration for actorgraph-rs
//!
//! Runtime tuning (timer interval, mailbox sizes), parameter defaults and
//! logging options are read from a TOML file. Missing sections and fields
//! fall back to their defaults, so an empty file is a valid configuration.
//!
//! # Config Location
//!
//! The default config file lives in the platform config directory:
//! - **Linux**: `~/.config/dev.actorgraph.actorgraph-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.actorgraph.actorgraph-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.actorgraph.actorgraph-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! [runtime]
//! timer_interval_ms = 16
//! mailbox_capacity = 1024
//!
//! [logging]
//! filter = "info,actorgraph_rs=trace"
//! file = "/tmp/actorgraph.log"
//! ```

use crate::error::{ActorGraphError, Result};
use crate::params::DEFAULT_MAX_STRING_LEN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "dev.actorgraph.actorgraph-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default actor timer period in milliseconds
pub const DEFAULT_TIMER_INTERVAL_MS: u64 = 16;

/// Default bounded mailbox size per actor
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Default time a sender waits on a full mailbox before dropping
pub const DEFAULT_ENQUEUE_TIMEOUT_MS: u64 = 5;

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,actorgraph_rs=debug";

/// Get the application config directory path
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Path of the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Actor runtime tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Period of the `Timer` message. 0 disables the timer.
    pub timer_interval_ms: u64,
    pub mailbox_capacity: usize,
    pub enqueue_timeout_ms: u64,
}

impl RuntimeConfig {
    pub fn timer_interval(&self) -> Option<Duration> {
        (self.timer_interval_ms > 0).then(|| Duration::from_millis(self.timer_interval_ms))
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer_interval_ms: DEFAULT_TIMER_INTERVAL_MS,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            enqueue_timeout_ms: DEFAULT_ENQUEUE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterConfig {
    /// Length limit for string parameters that declare none.
    pub max_string_len: usize,
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Optional log file; rotated daily.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runtime: RuntimeConfig,
    pub parameters: ParameterConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ActorGraphError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ActorGraphError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load from `path` (or the default location), returning defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ActorGraphError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ActorGraphError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ActorGraphError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.runtime.timer_interval_ms, 16);
        assert_eq!(config.runtime.mailbox_capacity, 1024);
        assert_eq!(config.runtime.enqueue_timeout(), Duration::from_millis(5));
        assert_eq!(config.parameters.max_string_len, 256);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str("[runtime]\ntimer_interval_ms = 0\n").unwrap();
        assert_eq!(config.runtime.timer_interval(), None);
        assert_eq!(config.runtime.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        assert_eq!(config.parameters, ParameterConfig::default());

        let empty: AppConfig = toml::from_str("").unwrap();
        assert_eq!(empty, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.runtime.mailbox_capacity = 16;
        config.logging.file = Some(dir.path().join("actorgraph.log"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "runtime = 3").unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(ActorGraphError::Config(_))
        ));
        assert_eq!(AppConfig::load_or_default(Some(&path)), AppConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(AppConfig::load_or_default(Some(&path)), AppConfig::default());
    }
}
