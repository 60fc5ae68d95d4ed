//! Task submission - create the Pending snapshot, then spawn the worker
//!
//! The submitting call path never blocks on the work: the Pending snapshot
//! is written synchronously so a poll issued immediately after submission
//! already sees the task, then the worker runs on its own tokio task and
//! writes the terminal snapshot when it finishes. There is no forced
//! cancellation; once dispatched, a worker runs to completion or failure.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::record::TaskError;
use super::store::{StatusError, StatusStore};

/// Submit asynchronous work and return its task ID immediately
///
/// `id` may be caller-supplied (idempotent per ID; resubmitting a live ID
/// fails) or `None` to generate one. The worker marks the task Processing,
/// awaits `work`, and records the outcome.
pub fn submit<T, F>(store: &Arc<StatusStore<T>>, id: Option<String>, work: F) -> Result<String, StatusError>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    F: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    let id = id.unwrap_or_else(|| Uuid::now_v7().to_string());
    debug!(%id, "submit: called");

    // Pending snapshot lands before the caller gets the ID back
    store.create(&id)?;

    let store = Arc::clone(store);
    let task_id = id.clone();
    tokio::spawn(async move {
        if let Err(e) = store.mark_processing(&task_id) {
            warn!(id = %task_id, error = %e, "Could not mark task processing");
        }

        match work.await {
            Ok(result) => {
                if let Err(e) = store.complete(&task_id, result) {
                    warn!(id = %task_id, error = %e, "Could not record task completion");
                }
                info!(id = %task_id, "Task worker completed");
            }
            Err(error) => {
                info!(id = %task_id, error = %error.message, "Task worker failed");
                if let Err(e) = store.fail(&task_id, error) {
                    warn!(id = %task_id, error = %e, "Could not record task failure");
                }
            }
        }
    });

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TaskCache;
    use crate::task::TaskState;
    use kvstore::KvStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> Arc<StatusStore<String>> {
        let kv = Arc::new(KvStore::open(temp.path()).unwrap());
        Arc::new(StatusStore::new(TaskCache::new(kv, "tasks", Duration::from_secs(60))))
    }

    async fn wait_for_terminal(store: &Arc<StatusStore<String>>, id: &str) {
        for _ in 0..100 {
            if store.get(id).map(|r| r.state.is_terminal()).unwrap_or(false) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {} never reached a terminal state", id);
    }

    #[tokio::test]
    async fn test_submit_returns_immediately_with_pending() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();
        let id = submit(&store, None, async move {
            let _ = gate_rx.await;
            Ok("done".to_string())
        })
        .unwrap();

        // Worker is gated, so the snapshot is Pending or Processing
        let state = store.get(&id).unwrap().state;
        assert!(!state.is_terminal());

        gate_tx.send(()).unwrap();
        wait_for_terminal(&store, &id).await;
        assert_eq!(store.get(&id).unwrap().state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_submit_with_caller_supplied_id() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let id = submit(&store, Some("t-custom".to_string()), async { Ok("ok".to_string()) }).unwrap();
        assert_eq!(id, "t-custom");

        wait_for_terminal(&store, "t-custom").await;
        assert_eq!(store.get("t-custom").unwrap().result.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_submit_duplicate_live_id_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let (_gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();
        submit(&store, Some("t-1".to_string()), async move {
            let _ = gate_rx.await;
            Ok("first".to_string())
        })
        .unwrap();

        let second = submit(&store, Some("t-1".to_string()), async { Ok("second".to_string()) });
        assert!(matches!(second, Err(StatusError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_worker_failure_is_recorded() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let id = submit(&store, None, async {
            Err::<String, _>(TaskError::with_status("transcription failed", 422))
        })
        .unwrap();

        wait_for_terminal(&store, &id).await;
        let record = store.get(&id).unwrap();
        assert_eq!(record.state, TaskState::Failed);
        assert_eq!(record.error.unwrap().status_code, Some(422));
    }
}
