use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{StorageError, StorageResult};

/// Default quota for each storage area: 5 MiB, the common browser limit.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Configuration for the storage areas.
///
/// Loaded from TOML:
///
/// ```toml
/// path = "state/stash.json"
/// quota_bytes = 1048576
/// session_quota_bytes = 0   # no limit
/// ```
///
/// A quota of `0` disables the limit, the same as `None`. Read quotas through
/// [`StorageConfig::local_quota`] and [`StorageConfig::session_quota`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File backing the persistent (local) area.
    pub path: PathBuf,
    /// Quota for the persistent area. `None` or `Some(0)` disables the
    /// limit; TOML files that omit the field get the default.
    #[serde(serialize_with = "quota_to_toml")]
    pub quota_bytes: Option<u64>,
    /// Quota for the in-memory (session) area, with the same conventions.
    #[serde(serialize_with = "quota_to_toml")]
    pub session_quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stash.json"),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            session_quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

impl StorageConfig {
    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        toml::from_str(text).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Load a configuration file.
    ///
    /// A relative `path` inside the file is resolved against the directory
    /// containing the configuration file.
    pub fn load(config_path: impl AsRef<Path>) -> StorageResult<Self> {
        let config_path = config_path.as_ref();
        let text = fs::read_to_string(config_path).map_err(|e| {
            StorageError::Config(format!("cannot read {}: {e}", config_path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.path.is_relative() {
            if let Some(dir) = config_path.parent() {
                config.path = dir.join(&config.path);
            }
        }
        Ok(config)
    }

    /// Effective quota for the persistent area, `None` when unlimited.
    pub fn local_quota(&self) -> Option<u64> {
        effective_quota(self.quota_bytes)
    }

    /// Effective quota for the session area, `None` when unlimited.
    pub fn session_quota(&self) -> Option<u64> {
        effective_quota(self.session_quota_bytes)
    }

    /// Render this configuration as TOML.
    pub fn to_toml_string(&self) -> StorageResult<String> {
        toml::to_string_pretty(self).map_err(|e| StorageError::Config(e.to_string()))
    }
}

fn effective_quota(quota: Option<u64>) -> Option<u64> {
    quota.filter(|&q| q > 0)
}

// TOML has no null, so an unlimited quota is written as 0.
fn quota_to_toml<S: Serializer>(quota: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(quota.unwrap_or(0))
}
