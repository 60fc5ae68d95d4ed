//! Asynchronous task execution and status tracking
//!
//! A submitted task gets a Pending snapshot before its worker starts, the
//! worker runs detached, and pollers read snapshots through the service
//! façade. Snapshots are written through to the persistent cache so status
//! survives a restart until its TTL elapses.

mod record;
mod service;
mod store;
mod submit;

pub use record::{TaskError, TaskRecord, TaskState};
pub use service::{DEFAULT_FAILURE_STATUS, ErrorDto, TaskStatusDto, TaskStatusService};
pub use store::{StatusError, StatusStore};
pub use submit::submit;
