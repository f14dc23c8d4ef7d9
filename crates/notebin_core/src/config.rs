//! File-based configuration.
//!
//! # Responsibility
//! - Load `notebin.toml` into typed settings with defaults for every key.
//! - Reject settings the core cannot honor before any storage is opened.
//!
//! # Invariants
//! - `retention.days` is at least 1.
//! - `storage.path` is non-empty.

use crate::service::note_service::{RetentionPolicy, DEFAULT_RETENTION_DAYS};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE: &str = "notebin.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage: Storage,
    pub logging: Logging,
    pub retention: Retention,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Storage {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub level: String,
    /// Absolute directory for rolling log files; file logging is off when unset.
    pub dir: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Retention {
    pub days: u32,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Retention {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::days(self.days)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Validation(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Validation(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

/// Reads, parses and validates a TOML config file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate(&cfg)?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.storage.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage.path must be non-empty".to_string(),
        ));
    }
    if cfg.retention.days == 0 {
        return Err(ConfigError::Validation(
            "retention.days must be greater than zero".to_string(),
        ));
    }
    if let Some(dir) = cfg.logging.dir.as_deref() {
        if !dir.is_absolute() {
            return Err(ConfigError::Validation(format!(
                "logging.dir must be an absolute path, got `{}`",
                dir.display()
            )));
        }
    }
    Ok(())
}
