//! DeviceHub core - async task tracking, provider failover, skill dispatch
//!
//! The in-process core of a device-control backend. Transport layers
//! (controllers, brokers) sit above it and are out of scope here.
//!
//! # Core Concepts
//!
//! - **Status survives restarts**: every task snapshot is written through
//!   to a durable, TTL-bounded cache; the in-memory table stays
//!   authoritative while the process lives
//! - **Ordered failover**: unreliable providers are tried in a fixed order,
//!   skipping known-unhealthy ones, surfacing only the final outcome
//! - **Open skill set**: instructions are classified and dispatched through
//!   a registry, so new skills never touch the orchestrator
//!
//! # Modules
//!
//! - [`task`] - status records, the concurrency-safe store, polling service,
//!   and async submission
//! - [`cache`] - persistent task cache over a durable key/value store
//! - [`failover`] - generic ordered-provider executor
//! - [`providers`] - text-generation and transcription provider shapes
//! - [`skill`] - skill registry, intent classifier, and orchestrator
//! - [`config`] - configuration types and loading

pub mod cache;
pub mod config;
pub mod failover;
pub mod providers;
pub mod skill;
pub mod task;

// Re-export commonly used types
pub use cache::{CacheError, DurableKv, TaskCache};
pub use config::{CacheConfig, Config};
pub use failover::{FailoverClient, Provider, ProviderError};
pub use providers::{TextClient, TextRequest, TextResponse, TranscribeClient, TranscribeRequest, Transcript};
pub use skill::{FallbackSkill, IntentClassifier, Orchestrator, Skill, SkillError, SkillRegistry};
pub use task::{
    DEFAULT_FAILURE_STATUS, ErrorDto, StatusError, StatusStore, TaskError, TaskRecord, TaskState, TaskStatusDto,
    TaskStatusService, submit,
};
