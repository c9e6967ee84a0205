//! Layered settings: serde defaults, then an optional TOML file, then `QV_*`
//! environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `QV_STORAGE__BACKEND=sled` or `QV_GOVERNANCE__MAX_DESCRIPTION_URI_LEN=128`.

use config::{Config, ConfigError, Environment, File as ConfigFile};
use qv_types::MAX_DESCRIPTION_URI_LEN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "QV";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration file {0} not found")]
    MissingFile(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub governance: GovernanceSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceSettings {
    pub max_description_uri_len: usize,
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self {
            max_description_uri_len: MAX_DESCRIPTION_URI_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Database directory, used by the sled backend only.
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/governance"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load settings, reading `path` when given. A missing explicit file is
    /// an error rather than a silent fallback to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(SettingsError::MissingFile(path.to_path_buf()));
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.governance.max_description_uri_len == 0 {
            return Err(SettingsError::Invalid {
                key: "governance.max_description_uri_len",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "logging.level",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
