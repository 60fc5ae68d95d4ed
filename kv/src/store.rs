//! Core KvStore implementation

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the underlying store
///
/// Callers are expected to treat these as "store unavailable" rather than
/// fatal conditions; an in-memory layer above remains authoritative.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk envelope for a single entry
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    /// Original key (the filename is a hash, so keep the key for inspection)
    key: String,
    /// Stored value, opaque to the store
    value: String,
    /// Expiry timestamp in unix milliseconds
    expires_at_ms: i64,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// File-backed key/value store with per-entry TTL
pub struct KvStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl KvStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened kv store");
        Ok(Self { base_path })
    }

    /// Write a value with the given TTL, replacing any existing entry
    pub fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        debug!(%key, ttl_secs = ttl.as_secs(), "KvStore::set: called");
        let entry = Entry {
            key: key.to_string(),
            value: value.to_string(),
            expires_at_ms: now_ms() + ttl.as_millis() as i64,
        };
        self.write_entry(&entry)
    }

    /// Write a value at an absolute expiry timestamp (unix ms)
    ///
    /// Used by TTL-preserving updates: the caller reads the existing expiry
    /// and reapplies it to the replacement value.
    pub fn set_with_expiry(&self, key: &str, value: &str, expires_at_ms: i64) -> Result<(), KvError> {
        debug!(%key, expires_at_ms, "KvStore::set_with_expiry: called");
        let entry = Entry {
            key: key.to_string(),
            value: value.to_string(),
            expires_at_ms,
        };
        self.write_entry(&entry)
    }

    /// Read a value
    ///
    /// Returns `Ok(None)` when the key is absent, expired, or the entry
    /// file is unreadable as an entry (corruption is treated as a miss).
    pub fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        debug!(%key, "KvStore::get: called");
        Ok(self.read_entry(key)?.map(|e| e.value))
    }

    /// Absolute expiry timestamp for a live entry (unix ms)
    pub fn expires_at(&self, key: &str) -> Result<Option<i64>, KvError> {
        debug!(%key, "KvStore::expires_at: called");
        Ok(self.read_entry(key)?.map(|e| e.expires_at_ms))
    }

    /// Remaining TTL for a live entry
    pub fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, KvError> {
        debug!(%key, "KvStore::ttl_remaining: called");
        let now = now_ms();
        Ok(self
            .read_entry(key)?
            .map(|e| Duration::from_millis((e.expires_at_ms - now).max(0) as u64)))
    }

    /// Remove an entry (idempotent)
    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        debug!(%key, "KvStore::delete: called");
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{:016x}.json", key_hash(key)))
    }

    fn write_entry(&self, entry: &Entry) -> Result<(), KvError> {
        let path = self.entry_path(&entry.key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(entry)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_entry(&self, key: &str) -> Result<Option<Entry>, KvError> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: Entry = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(e) => {
                // Corrupted entry: treat as a miss and drop the file
                warn!(%key, error = %e, "Unreadable kv entry, treating as miss");
                let _ = fs::remove_file(&path);
                return Ok(None);
            }
        };

        if entry.is_expired(now_ms()) {
            debug!(%key, "KvStore::read_entry: entry expired, evicting");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        Ok(Some(entry))
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Stable hash for filenames (not cryptographic, just collision-unlikely
/// and filesystem-safe for arbitrary keys)
fn key_hash(key: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
