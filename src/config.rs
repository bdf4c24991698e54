//! Node configuration
//!
//! A single JSON file:
//!
//! ```json
//! { "data_dir": "./data", "chain_id": "idchain-dev", "backend": "file", "log_level": "info" }
//! ```
//!
//! `backend` and `log_level` are optional. The file is validated right after
//! it is parsed; a node never starts on a partially valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    /// Volatile. Nothing survives the process.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: String,

    pub chain_id: String,

    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        if self.chain_id.trim().is_empty() {
            return Err(ConfigError::Invalid("chain_id must not be empty".into()));
        }
        self.min_severity()?;
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Minimum severity written by the logger.
    pub fn min_severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid log_level '{}': expected trace, info, warn or error",
                self.log_level
            ))
        })
    }
}
