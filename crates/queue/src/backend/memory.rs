use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    BackendResult, FailOutcome, Job, JobBackend, QueueCounts, QueuePolicy, Retention, now_ms,
};

/// Single-process backend. Jobs do not survive a restart.
pub struct MemoryBackend {
    policy: QueuePolicy,
    queues: Mutex<HashMap<String, MemoryQueue>>,
}

#[derive(Default)]
struct MemoryQueue {
    waiting: VecDeque<Job>,
    active: HashMap<String, Job>,
    /// `(run_at_ms, job)`
    delayed: Vec<(i64, Job)>,
    /// `(finished_at_ms, job)`, oldest first
    completed: VecDeque<(i64, Job)>,
    failed: VecDeque<(i64, Job)>,
}

impl MemoryBackend {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            queues: Mutex::new(HashMap::new()),
        }
    }
}

fn prune(set: &mut VecDeque<(i64, Job)>, retention: &Retention, now: i64) {
    let cutoff = now - retention.age.as_millis() as i64;
    while let Some((finished_at, _)) = set.front() {
        if *finished_at < cutoff || set.len() as u64 > retention.count {
            set.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl JobBackend for MemoryBackend {
    async fn enqueue(&self, queue: &str, payload: serde_json::Value) -> BackendResult<Job> {
        let job = Job::new(queue, payload, self.policy.attempts);
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .waiting
            .push_back(job.clone());
        Ok(job)
    }

    async fn claim(&self, queue: &str) -> BackendResult<Option<Job>> {
        let mut queues = self.queues.lock().await;
        let Some(q) = queues.get_mut(queue) else {
            return Ok(None);
        };
        let Some(job) = q.waiting.pop_front() else {
            return Ok(None);
        };
        q.active.insert(job.id.clone(), job.clone());
        Ok(Some(job))
    }

    async fn complete(&self, job: &Job) -> BackendResult<()> {
        let now = now_ms();
        let mut queues = self.queues.lock().await;
        let q = queues.entry(job.queue.clone()).or_default();
        let finished = q.active.remove(&job.id).unwrap_or_else(|| job.clone());
        q.completed.push_back((now, finished));
        prune(&mut q.completed, &self.policy.keep_completed, now);
        Ok(())
    }

    async fn fail(&self, job: &Job, reason: &str, retryable: bool) -> BackendResult<FailOutcome> {
        let now = now_ms();
        let mut queues = self.queues.lock().await;
        let q = queues.entry(job.queue.clone()).or_default();

        let mut failed = q.active.remove(&job.id).unwrap_or_else(|| job.clone());
        failed.attempts_made += 1;
        failed.failed_reason = Some(reason.to_string());

        let outcome = self.policy.on_failure(&failed, retryable);
        match outcome {
            FailOutcome::Retrying { delay } => {
                q.delayed.push((now + delay.as_millis() as i64, failed));
            }
            FailOutcome::Failed => {
                q.failed.push_back((now, failed));
                prune(&mut q.failed, &self.policy.keep_failed, now);
            }
        }
        Ok(outcome)
    }

    async fn promote_delayed(&self, queue: &str) -> BackendResult<usize> {
        let now = now_ms();
        let mut queues = self.queues.lock().await;
        let Some(q) = queues.get_mut(queue) else {
            return Ok(0);
        };

        let (due, pending): (Vec<_>, Vec<_>) =
            q.delayed.drain(..).partition(|(run_at, _)| *run_at <= now);
        q.delayed = pending;

        let promoted = due.len();
        q.waiting.extend(due.into_iter().map(|(_, job)| job));
        Ok(promoted)
    }

    async fn counts(&self, queue: &str) -> BackendResult<QueueCounts> {
        let queues = self.queues.lock().await;
        Ok(queues
            .get(queue)
            .map(|q| QueueCounts {
                waiting: q.waiting.len() as u64,
                active: q.active.len() as u64,
                delayed: q.delayed.len() as u64,
                completed: q.completed.len() as u64,
                failed: q.failed.len() as u64,
            })
            .unwrap_or_default())
    }
}
