//! KvStore - file-backed durable key/value store with TTL
//!
//! Stores each entry as a single JSON file containing the value and its
//! expiry timestamp. Expired and unreadable entries behave as absent;
//! eviction is lazy (performed on read).
//!
//! # Architecture
//!
//! ```text
//! .kvstore/
//! ├── {key-hash-1}.json    # { key, value, expires_at_ms }
//! ├── {key-hash-2}.json
//! └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kvstore::KvStore;
//! use std::time::Duration;
//!
//! let store = KvStore::open(".kvstore")?;
//! store.set("tasks:t-1", r#"{"status":"pending"}"#, Duration::from_secs(600))?;
//! let value = store.get("tasks:t-1")?;
//! ```

mod store;

pub use store::{KvError, KvStore};

/// Default TTL applied when a caller does not specify one (10 minutes)
pub const DEFAULT_TTL_SECS: u64 = 600;
