//! Configuration management for parktally.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::JsonFileStore;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "parktally";

/// Default snapshot file name.
const DATA_FILE_NAME: &str = "parkingData.json";

/// Default console prompt.
const DEFAULT_PROMPT: &str = "parktally> ";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PARKTALLY_`)
/// 2. TOML config file at `~/.config/parktally/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Console configuration.
    pub console: ConsoleConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the snapshot file.
    /// Defaults to `~/.local/share/parktally/parkingData.json`
    pub data_path: Option<PathBuf>,
    /// Write snapshots to a temporary file and rename it into place.
    pub atomic_writes: bool,
}

/// Console-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prompt printed before each line. Empty disables it.
    pub prompt: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: None, // Will be resolved to default at runtime
            atomic_writes: true,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `PARKTALLY_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PARKTALLY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.storage.data_path {
            if path.file_name().is_none() {
                return Err(Error::ConfigValidation {
                    message: format!("data_path must name a file: {}", path.display()),
                });
            }
        }

        Ok(())
    }

    /// Get the snapshot path, resolving defaults if not set.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.storage
            .data_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Build the snapshot store this configuration describes.
    #[must_use]
    pub fn snapshot_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.data_path()).with_atomic_writes(self.storage.atomic_writes)
    }

    /// Get the console prompt, or `None` if disabled.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        if self.console.prompt.is_empty() {
            None
        } else {
            Some(&self.console.prompt)
        }
    }
}
