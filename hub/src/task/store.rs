//! StatusStore - concurrency-safe task status table with write-through durability
//!
//! Single source of truth for task status during the life of the process.
//! Map mutations are serialized by one RwLock scoped to the store instance;
//! the lock is never held across a cache call. Cache writes happen after
//! the in-memory write, accepting a brief window where memory and disk can
//! diverge - memory always wins on read.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::TaskCache;

use super::record::{TaskError, TaskRecord, TaskState};

/// Errors from status table operations
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid transition for task {id}: {from} -> {to}")]
    InvalidTransition { id: String, from: TaskState, to: TaskState },
}

/// In-memory task status table backed by a [`TaskCache`]
pub struct StatusStore<T> {
    tasks: RwLock<HashMap<String, TaskRecord<T>>>,
    cache: TaskCache,
}

impl<T> StatusStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a store over the given cache
    pub fn new(cache: TaskCache) -> Self {
        debug!("StatusStore::new: called");
        Self {
            tasks: RwLock::new(HashMap::new()),
            cache,
        }
    }

    /// Insert a Pending snapshot for a new task
    ///
    /// Fails with [`StatusError::AlreadyExists`] while an unexpired record
    /// with the same ID is still present; use
    /// [`create_or_replace`](Self::create_or_replace) to overwrite explicitly.
    pub fn create(&self, id: &str) -> Result<(), StatusError> {
        debug!(%id, "StatusStore::create: called");
        let record = {
            let mut tasks = self.tasks.write().expect("status table lock poisoned");
            if let Some(existing) = tasks.get(id)
                && !existing.is_expired(now_ms())
            {
                debug!(%id, "StatusStore::create: live record already present");
                return Err(StatusError::AlreadyExists(id.to_string()));
            }
            let record = self.fresh_record(id);
            tasks.insert(id.to_string(), record.clone());
            record
        };

        self.persist_initial(&record);
        info!(%id, "Task created");
        Ok(())
    }

    /// Insert a Pending snapshot, overwriting any existing record
    pub fn create_or_replace(&self, id: &str) {
        debug!(%id, "StatusStore::create_or_replace: called");
        let record = {
            let mut tasks = self.tasks.write().expect("status table lock poisoned");
            let record = self.fresh_record(id);
            tasks.insert(id.to_string(), record.clone());
            record
        };

        self.persist_initial(&record);
        info!(%id, "Task created (replaced any prior record)");
    }

    /// Atomically replace the snapshot for a task
    ///
    /// The transition must respect the monotonic state ordering. The new
    /// snapshot is written through to the cache with its TTL preserved.
    pub fn update(
        &self,
        id: &str,
        state: TaskState,
        result: Option<T>,
        error: Option<TaskError>,
    ) -> Result<(), StatusError> {
        debug!(%id, %state, "StatusStore::update: called");
        let snapshot = {
            let mut tasks = self.tasks.write().expect("status table lock poisoned");
            let now = now_ms();
            if tasks.get(id).is_some_and(|r| r.is_expired(now)) {
                tasks.remove(id);
                return Err(StatusError::NotFound(id.to_string()));
            }
            let record = tasks.get_mut(id).ok_or_else(|| StatusError::NotFound(id.to_string()))?;

            if !record.state.can_transition_to(state) {
                debug!(%id, from = %record.state, to = %state, "StatusStore::update: rejected regression");
                return Err(StatusError::InvalidTransition {
                    id: id.to_string(),
                    from: record.state,
                    to: state,
                });
            }

            record.apply(state, result, error);
            record.clone()
        };

        // Cache write happens outside the lock; failure degrades durability only
        if let Err(e) = self.cache.set_preserving_ttl(id, &snapshot) {
            warn!(%id, error = %e, "Cache unavailable, task update kept in memory only");
        }
        info!(%id, %state, "Task updated");
        Ok(())
    }

    /// Mark a task as Processing (the optional mid-flight transition)
    pub fn mark_processing(&self, id: &str) -> Result<(), StatusError> {
        self.update(id, TaskState::Processing, None, None)
    }

    /// Terminal transition to Completed with a result payload
    pub fn complete(&self, id: &str, result: T) -> Result<(), StatusError> {
        self.update(id, TaskState::Completed, Some(result), None)
    }

    /// Terminal transition to Failed with error details
    pub fn fail(&self, id: &str, error: TaskError) -> Result<(), StatusError> {
        self.update(id, TaskState::Failed, None, Some(error))
    }

    /// Fetch the current snapshot for a task
    ///
    /// Memory is consulted first; on a miss the cache is checked (restart
    /// recovery) and a hit re-hydrates the in-memory table. Expired records
    /// are evicted and reported as absent. Cache errors are a miss, never
    /// an error.
    pub fn get(&self, id: &str) -> Option<TaskRecord<T>> {
        debug!(%id, "StatusStore::get: called");
        let now = now_ms();

        let in_memory = {
            let tasks = self.tasks.read().expect("status table lock poisoned");
            tasks.get(id).cloned()
        };

        match in_memory {
            Some(record) if !record.is_expired(now) => return Some(record),
            Some(_) => {
                debug!(%id, "StatusStore::get: record expired, evicting");
                self.evict(id);
                return None;
            }
            None => {}
        }

        // Miss: try the persistent copy left by a previous process
        let cached: Option<TaskRecord<T>> = match self.cache.get(id) {
            Ok(c) => c,
            Err(e) => {
                warn!(%id, error = %e, "Cache unavailable during lookup");
                None
            }
        };
        let cached = cached.filter(|r| !r.is_expired(now))?;

        debug!(%id, "StatusStore::get: re-hydrated from cache");
        let mut tasks = self.tasks.write().expect("status table lock poisoned");
        // A concurrent writer may have raced us here; memory wins
        Some(tasks.entry(id.to_string()).or_insert(cached).clone())
    }

    /// Extend a task's TTL
    ///
    /// This is the only operation that moves an established expiry.
    pub fn refresh_ttl(&self, id: &str, ttl: Duration) -> Result<(), StatusError> {
        debug!(%id, ttl_secs = ttl.as_secs(), "StatusStore::refresh_ttl: called");
        let snapshot = {
            let mut tasks = self.tasks.write().expect("status table lock poisoned");
            let record = tasks.get_mut(id).ok_or_else(|| StatusError::NotFound(id.to_string()))?;
            record.expires_at_ms = now_ms() + ttl.as_millis() as i64;
            record.clone()
        };

        if let Err(e) = self.cache.set(id, &snapshot, ttl) {
            warn!(%id, error = %e, "Cache unavailable, TTL refresh kept in memory only");
        }
        Ok(())
    }

    /// Immediately invalidate a task in memory and in the cache
    pub fn delete(&self, id: &str) {
        debug!(%id, "StatusStore::delete: called");
        self.evict(id);
        info!(%id, "Task deleted");
    }

    /// Remaining TTL for a task, computed at read time
    pub fn ttl_remaining(&self, id: &str) -> Option<Duration> {
        let record = self.get(id)?;
        let remaining_ms = (record.expires_at_ms - now_ms()).max(0);
        Some(Duration::from_millis(remaining_ms as u64))
    }

    fn fresh_record(&self, id: &str) -> TaskRecord<T> {
        let expires_at_ms = now_ms() + self.cache.default_ttl().as_millis() as i64;
        TaskRecord::pending(id, expires_at_ms)
    }

    fn persist_initial(&self, record: &TaskRecord<T>) {
        if let Err(e) = self.cache.set(&record.id, record, self.cache.default_ttl()) {
            warn!(id = %record.id, error = %e, "Cache unavailable, task exists in memory only");
        }
    }

    fn evict(&self, id: &str) {
        {
            let mut tasks = self.tasks.write().expect("status table lock poisoned");
            tasks.remove(id);
        }
        if let Err(e) = self.cache.delete(id) {
            warn!(%id, error = %e, "Cache unavailable during delete");
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
