//! Task status record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task
///
/// States are ordered by phase and never regress: a Completed or Failed
/// task cannot go back to Pending or Processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Submitted, worker not started yet
    Pending,
    /// Worker is running
    Processing,
    /// Terminal: finished with a result
    Completed,
    /// Terminal: finished with an error
    Failed,
}

impl TaskState {
    /// Phase ordering used for the monotonicity check
    fn phase(&self) -> u8 {
        match self {
            TaskState::Pending => 0,
            TaskState::Processing => 1,
            TaskState::Completed | TaskState::Failed => 2,
        }
    }

    /// Whether this state is terminal (Completed or Failed)
    pub fn is_terminal(&self) -> bool {
        self.phase() == 2
    }

    /// Whether a transition to `next` respects the monotonic ordering
    ///
    /// Same-phase transitions are allowed (last writer wins between
    /// concurrent terminal updates); regressing to an earlier phase is not.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        next.phase() >= self.phase()
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Processing => "processing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Failure details for a terminal Failed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    /// Human-readable failure message
    pub message: String,
    /// HTTP-style status code, when the failure carries one
    pub status_code: Option<u16>,
}

impl TaskError {
    /// Failure with a message only (pollers see the default failure code)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }

    /// Failure with an explicit status code
    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
        }
    }
}

/// Status snapshot for one task, generic over its result payload
///
/// Exactly one record exists per task ID. `result` is present only when
/// Completed, `error` only when Failed. `expires_at_ms` is fixed at
/// creation and only moves through an explicit TTL refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord<T> {
    /// Opaque unique identifier, immutable for the task's lifetime
    pub id: String,
    /// Current lifecycle state
    pub state: TaskState,
    /// Result payload, present only when Completed
    pub result: Option<T>,
    /// Failure details, present only when Failed
    pub error: Option<TaskError>,
    /// Expiry timestamp in unix milliseconds
    pub expires_at_ms: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl<T> TaskRecord<T> {
    /// Create a Pending record expiring at the given timestamp
    pub fn pending(id: impl Into<String>, expires_at_ms: i64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: TaskState::Pending,
            result: None,
            error: None,
            expires_at_ms,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has outlived its TTL
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Apply a state transition, replacing result/error with the new outcome
    pub fn apply(&mut self, state: TaskState, result: Option<T>, error: Option<TaskError>) {
        self.state = state;
        self.result = result;
        self.error = error;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_monotonicity() {
        assert!(TaskState::Pending.can_transition_to(TaskState::Processing));
        assert!(TaskState::Pending.can_transition_to(TaskState::Completed));
        assert!(TaskState::Processing.can_transition_to(TaskState::Failed));

        // Regressions are rejected
        assert!(!TaskState::Processing.can_transition_to(TaskState::Pending));
        assert!(!TaskState::Completed.can_transition_to(TaskState::Pending));
        assert!(!TaskState::Failed.can_transition_to(TaskState::Processing));

        // Same phase is allowed (last terminal writer wins)
        assert!(TaskState::Completed.can_transition_to(TaskState::Failed));
        assert!(TaskState::Completed.can_transition_to(TaskState::Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn test_pending_record_shape() {
        let record: TaskRecord<String> = TaskRecord::pending("t-1", 1_000);
        assert_eq!(record.id, "t-1");
        assert_eq!(record.state, TaskState::Pending);
        assert!(record.result.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_apply_updates_timestamp() {
        let mut record: TaskRecord<String> = TaskRecord::pending("t-1", 1_000);
        let created = record.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));

        record.apply(TaskState::Completed, Some("done".to_string()), None);
        assert_eq!(record.state, TaskState::Completed);
        assert_eq!(record.result.as_deref(), Some("done"));
        assert!(record.updated_at > created);
    }

    #[test]
    fn test_serde_state_is_lowercase() {
        let json = serde_json::to_string(&TaskState::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
