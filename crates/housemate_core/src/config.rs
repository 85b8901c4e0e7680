//! Store configuration.
//!
//! # Responsibility
//! - Describe where snapshots live and how long chat messages survive.
//! - Normalize and reject unusable values before a store opens.
//!
//! The core reads no environment variables or config files; callers build a
//! `StoreConfig` in code.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Storage key for the full-state snapshot.
pub const DEFAULT_SNAPSHOT_KEY: &str = "housemate-state-v1";
/// Chat messages disappear after 24 hours.
pub const DEFAULT_MESSAGE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite file path. `None` keeps snapshots in memory.
    pub db_path: Option<PathBuf>,
    pub snapshot_key: String,
    /// `None` disables message expiry.
    pub message_ttl_ms: Option<i64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            message_ttl_ms: Some(DEFAULT_MESSAGE_TTL_MS),
        }
    }
}

impl StoreConfig {
    /// Config backed by a SQLite file at `path`.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Returns a trimmed copy, or an error for unusable values.
    pub fn normalized(&self) -> Result<Self, ConfigError> {
        let snapshot_key = self.snapshot_key.trim();
        if snapshot_key.is_empty() {
            return Err(ConfigError::BlankSnapshotKey);
        }
        if let Some(ttl) = self.message_ttl_ms {
            if ttl <= 0 {
                return Err(ConfigError::InvalidMessageTtl(ttl));
            }
        }
        if let Some(path) = &self.db_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyDbPath);
            }
        }

        Ok(Self {
            db_path: self.db_path.clone(),
            snapshot_key: snapshot_key.to_string(),
            message_ttl_ms: self.message_ttl_ms,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    BlankSnapshotKey,
    InvalidMessageTtl(i64),
    EmptyDbPath,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankSnapshotKey => write!(f, "snapshot key cannot be empty"),
            Self::InvalidMessageTtl(value) => {
                write!(f, "message ttl must be positive milliseconds, got {value}")
            }
            Self::EmptyDbPath => write!(f, "db_path cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_SNAPSHOT_KEY};

    #[test]
    fn default_config_is_valid() {
        let config = StoreConfig::default().normalized().unwrap();
        assert_eq!(config.snapshot_key, DEFAULT_SNAPSHOT_KEY);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn normalized_trims_key_and_rejects_bad_ttl() {
        let config = StoreConfig {
            snapshot_key: "  custom  ".to_string(),
            ..StoreConfig::default()
        };
        assert_eq!(config.normalized().unwrap().snapshot_key, "custom");

        let config = StoreConfig {
            message_ttl_ms: Some(0),
            ..StoreConfig::default()
        };
        assert_eq!(
            config.normalized().unwrap_err(),
            ConfigError::InvalidMessageTtl(0)
        );
    }
}
