//! Persistent task cache - namespaced, TTL-aware adapter over a durable store
//!
//! The cache gives task snapshots durability across restarts. It is never
//! authoritative: the in-memory status table wins whenever the two disagree,
//! and a failing or corrupted cache degrades durability without affecting
//! the running process.

use std::sync::Arc;
use std::time::Duration;

use kvstore::{KvError, KvStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from cache operations
///
/// All variants mean "cache unavailable"; callers continue serving from
/// memory and log the degradation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(#[from] KvError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key/value capability consumed by the cache
///
/// `KvStore` is the shipped implementation; anything with string keys,
/// string values, and per-entry TTL can stand in (tests use an erroring
/// stub to exercise degraded mode).
pub trait DurableKv: Send + Sync {
    /// Write a value with a TTL, replacing any existing entry
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Write a value at an absolute expiry timestamp (unix ms)
    fn set_with_expiry(&self, key: &str, value: &str, expires_at_ms: i64) -> Result<(), KvError>;

    /// Read a value; absent, expired, and corrupted entries are all `None`
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Absolute expiry timestamp for a live entry (unix ms)
    fn expires_at(&self, key: &str) -> Result<Option<i64>, KvError>;

    /// Remaining TTL for a live entry
    fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, KvError>;

    /// Remove an entry (idempotent)
    fn delete(&self, key: &str) -> Result<(), KvError>;
}

impl DurableKv for KvStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        KvStore::set(self, key, value, ttl)
    }

    fn set_with_expiry(&self, key: &str, value: &str, expires_at_ms: i64) -> Result<(), KvError> {
        KvStore::set_with_expiry(self, key, value, expires_at_ms)
    }

    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        KvStore::get(self, key)
    }

    fn expires_at(&self, key: &str) -> Result<Option<i64>, KvError> {
        KvStore::expires_at(self, key)
    }

    fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, KvError> {
        KvStore::ttl_remaining(self, key)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        KvStore::delete(self, key)
    }
}

/// Namespaced, serde-encoded adapter over a [`DurableKv`]
///
/// Keys are prefixed so multiple task kinds can share one underlying store
/// without collisions.
pub struct TaskCache {
    kv: Arc<dyn DurableKv>,
    prefix: String,
    default_ttl: Duration,
}

impl TaskCache {
    /// Create a cache over the given store with a key prefix
    pub fn new(kv: Arc<dyn DurableKv>, prefix: impl Into<String>, default_ttl: Duration) -> Self {
        let prefix = prefix.into();
        debug!(%prefix, default_ttl_secs = default_ttl.as_secs(), "TaskCache::new: called");
        Self { kv, prefix, default_ttl }
    }

    /// Default TTL applied when no entry exists yet
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn namespaced(&self, id: &str) -> String {
        format!("{}:{}", self.prefix, id)
    }

    /// Write a value with an explicit TTL
    pub fn set<T: Serialize>(&self, id: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        debug!(%id, ttl_secs = ttl.as_secs(), "TaskCache::set: called");
        let encoded = serde_json::to_string(value)?;
        self.kv.set(&self.namespaced(id), &encoded, ttl)?;
        Ok(())
    }

    /// Write a value, keeping the remaining TTL of any existing entry
    ///
    /// Reads the current expiry before the destructive write and reapplies
    /// it, so a status transition never restarts the countdown. When no
    /// entry exists yet this behaves like [`set`](Self::set) with the
    /// default TTL.
    pub fn set_preserving_ttl<T: Serialize>(&self, id: &str, value: &T) -> Result<(), CacheError> {
        debug!(%id, "TaskCache::set_preserving_ttl: called");
        let key = self.namespaced(id);
        let encoded = serde_json::to_string(value)?;

        match self.kv.expires_at(&key)? {
            Some(expires_at_ms) => self.kv.set_with_expiry(&key, &encoded, expires_at_ms)?,
            None => self.kv.set(&key, &encoded, self.default_ttl)?,
        }
        Ok(())
    }

    /// Read a value
    ///
    /// Absent, expired, and undecodable entries are all `Ok(None)`; a
    /// persisted record that no longer decodes is a miss, not an error.
    pub fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, CacheError> {
        debug!(%id, "TaskCache::get: called");
        let Some(encoded) = self.kv.get(&self.namespaced(id))? else {
            return Ok(None);
        };

        match serde_json::from_str(&encoded) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(%id, error = %e, "Undecodable cached record, treating as miss");
                Ok(None)
            }
        }
    }

    /// Remaining TTL for a live entry
    pub fn ttl_remaining(&self, id: &str) -> Result<Option<Duration>, CacheError> {
        debug!(%id, "TaskCache::ttl_remaining: called");
        Ok(self.kv.ttl_remaining(&self.namespaced(id))?)
    }

    /// Remove an entry (idempotent)
    pub fn delete(&self, id: &str) -> Result<(), CacheError> {
        debug!(%id, "TaskCache::delete: called");
        self.kv.delete(&self.namespaced(id))?;
        Ok(())
    }
}
