//! Configuration types and loading

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use kvstore::KvStore;
use serde::{Deserialize, Serialize};

use crate::cache::TaskCache;

/// Main devicehub configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistent task cache configuration
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then project-local `.devicehub.yml`, then the user
    /// config directory, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".devicehub.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("devicehub").join("devicehub.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Persistent task cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for the durable store
    #[serde(rename = "store-path")]
    pub store_path: PathBuf,

    /// Namespace prefix for task keys
    pub prefix: String,

    /// Default TTL for newly persisted tasks, in seconds
    #[serde(rename = "default-ttl-secs")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            prefix: "tasks".to_string(),
            default_ttl_secs: kvstore::DEFAULT_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// Default TTL as a duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Open the configured store and build a task cache over it
    pub fn open(&self) -> Result<TaskCache> {
        let kv = KvStore::open(&self.store_path)
            .context(format!("Failed to open kv store at {}", self.store_path.display()))?;
        Ok(TaskCache::new(Arc::new(kv), self.prefix.clone(), self.default_ttl()))
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devicehub")
        .join("kv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.prefix, "tasks");
        assert_eq!(config.cache.default_ttl_secs, kvstore::DEFAULT_TTL_SECS);
    }

    #[test]
    fn test_load_from_yaml() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("devicehub.yml");
        std::fs::write(
            &path,
            "cache:\n  store-path: /tmp/hub-kv\n  prefix: iot\n  default-ttl-secs: 120\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache.prefix, "iot");
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(120));
        assert_eq!(config.cache.store_path, PathBuf::from("/tmp/hub-kv"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("devicehub.yml");
        std::fs::write(&path, "cache:\n  prefix: iot\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache.prefix, "iot");
        assert_eq!(config.cache.default_ttl_secs, kvstore::DEFAULT_TTL_SECS);
    }

    #[test]
    fn test_open_cache_from_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = CacheConfig {
            store_path: temp.path().join("kv"),
            prefix: "tasks".to_string(),
            default_ttl_secs: 60,
        };

        let cache = config.open().unwrap();
        assert_eq!(cache.default_ttl(), Duration::from_secs(60));
    }
}
