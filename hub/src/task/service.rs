//! TaskStatusService - polling façade over the status store
//!
//! Maps internal snapshots to the wire-facing DTO shape consumed by
//! transport controllers. "Never existed or already expired" is reported
//! as NotFound, distinct from a task that ran and Failed.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::record::TaskState;
use super::store::{StatusError, StatusStore};

/// Failure status code used when a failed task carries none
pub const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Wire-facing error shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDto {
    pub message: String,
    pub status_code: u16,
}

/// Wire-facing status snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatusDto<T> {
    /// Four-state status field: pending, processing, completed, failed
    pub status: TaskState,
    /// Present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// Present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDto>,
    /// Remaining TTL, computed at read time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,
}

/// Read-side service consumed by polling controllers
pub struct TaskStatusService<T> {
    store: Arc<StatusStore<T>>,
}

impl<T> TaskStatusService<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a service over a shared status store
    pub fn new(store: Arc<StatusStore<T>>) -> Self {
        debug!("TaskStatusService::new: called");
        Self { store }
    }

    /// Fetch the status DTO for a task
    ///
    /// Unknown and expired IDs are [`StatusError::NotFound`]; a Failed task
    /// is a successful lookup whose DTO carries the error details.
    pub fn get_task_status(&self, id: &str) -> Result<TaskStatusDto<T>, StatusError> {
        debug!(%id, "TaskStatusService::get_task_status: called");
        let record = self.store.get(id).ok_or_else(|| StatusError::NotFound(id.to_string()))?;

        let error = record.error.map(|e| ErrorDto {
            message: e.message,
            status_code: e.status_code.unwrap_or(DEFAULT_FAILURE_STATUS),
        });

        let expires_in_seconds = self.store.ttl_remaining(id).map(|d| d.as_secs());

        Ok(TaskStatusDto {
            status: record.state,
            result: record.result,
            error,
            expires_in_seconds,
        })
    }
}
