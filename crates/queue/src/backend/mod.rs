//! Job storage for the queue service.
//!
//! A job moves `waiting -> active -> completed`, or on failure either back
//! through `delayed` (a retry with exponential backoff) or into `failed` once
//! its attempts are used up. Completed and failed sets are pruned by age and
//! by count every time something lands in them.

pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_config::{QueueSettings, RedisSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown queue backend: {0}")]
    UnknownBackend(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub queue: String,
    pub payload: serde_json::Value,
    /// Attempts already made, including failed ones.
    pub attempts_made: u32,
    pub max_attempts: u32,
    /// Milliseconds since the epoch.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

impl Job {
    pub fn new(queue: &str, payload: serde_json::Value, max_attempts: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            queue: queue.to_string(),
            payload,
            attempts_made: 0,
            max_attempts,
            created_at: now_ms(),
            failed_reason: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retention {
    pub age: Duration,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuePolicy {
    pub attempts: u32,
    pub backoff: Duration,
    pub keep_completed: Retention,
    pub keep_failed: Retention,
}

impl QueuePolicy {
    pub fn from_settings(settings: &QueueSettings) -> Self {
        Self {
            attempts: settings.attempts.max(1),
            backoff: Duration::from_millis(settings.backoff_ms),
            keep_completed: Retention {
                age: Duration::from_secs(settings.completed_age_secs),
                count: settings.completed_count,
            },
            keep_failed: Retention {
                age: Duration::from_secs(settings.failed_age_secs),
                count: settings.failed_count,
            },
        }
    }

    /// Delay before the next attempt after `attempts_made` failures:
    /// `backoff * 2^(attempts_made - 1)`.
    pub fn backoff_for(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1u32 << exponent)
    }

    /// Decides what happens to a job that has just failed. `job` already
    /// carries the incremented attempt count.
    pub fn on_failure(&self, job: &Job, retryable: bool) -> FailOutcome {
        if retryable && job.attempts_made < job.max_attempts {
            FailOutcome::Retrying {
                delay: self.backoff_for(job.attempts_made),
            }
        } else {
            FailOutcome::Failed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailOutcome {
    Retrying { delay: Duration },
    Failed,
}

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq)]
pub struct QueueCounts {
    pub waiting: u64,
    pub active: u64,
    pub delayed: u64,
    pub completed: u64,
    pub failed: u64,
}

#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn enqueue(&self, queue: &str, payload: serde_json::Value) -> BackendResult<Job>;

    /// Atomically moves the oldest waiting job to the active set.
    async fn claim(&self, queue: &str) -> BackendResult<Option<Job>>;

    async fn complete(&self, job: &Job) -> BackendResult<()>;

    async fn fail(&self, job: &Job, reason: &str, retryable: bool) -> BackendResult<FailOutcome>;

    /// Moves delayed jobs whose backoff has elapsed back to waiting.
    async fn promote_delayed(&self, queue: &str) -> BackendResult<usize>;

    async fn counts(&self, queue: &str) -> BackendResult<QueueCounts>;
}

/// Picks the backend named by `queue.backend`.
pub async fn from_settings(
    queue: &QueueSettings,
    redis: &RedisSettings,
) -> BackendResult<Arc<dyn JobBackend>> {
    let policy = QueuePolicy::from_settings(queue);
    match queue.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBackend::new(policy))),
        "redis" => {
            let backend = RedisBackend::connect(&redis.url, &queue.key_prefix, policy).await?;
            Ok(Arc::new(backend))
        }
        other => Err(BackendError::UnknownBackend(other.to_string())),
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
