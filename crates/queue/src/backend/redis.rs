use std::collections::HashSet;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Direction};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::{
    BackendResult, FailOutcome, Job, JobBackend, QueueCounts, QueuePolicy, Retention, now_ms,
};

/// Redis layout per queue, under `{prefix}:{queue}`:
///
/// - `wait`, `active`: lists of job ids (`LPUSH` in, `LMOVE` right-to-left out)
/// - `delayed`: sorted set scored by the time the retry becomes due
/// - `completed`, `failed`: sorted sets scored by finish time
/// - `job:{id}`: the job as JSON
pub struct RedisBackend {
    conn: ConnectionManager,
    prefix: String,
    policy: QueuePolicy,
}

impl RedisBackend {
    pub async fn connect(url: &str, prefix: &str, policy: QueuePolicy) -> BackendResult<Self> {
        let client = ::redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!(%url, %prefix, "Connected redis queue backend");
        Ok(Self {
            conn,
            prefix: prefix.to_string(),
            policy,
        })
    }

    fn key(&self, queue: &str, part: &str) -> String {
        format!("{}:{}:{}", self.prefix, queue, part)
    }

    fn job_key(&self, queue: &str, id: &str) -> String {
        format!("{}:{}:job:{}", self.prefix, queue, id)
    }

    async fn store(&self, job: &Job) -> BackendResult<()> {
        let mut conn = self.conn.clone();
        let data = serde_json::to_string(job)?;
        let _: () = conn.set(self.job_key(&job.queue, &job.id), data).await?;
        Ok(())
    }

    /// Drops entries older than the retention age, then the oldest entries
    /// beyond the retention count, along with their job data.
    async fn prune(&self, queue: &str, set: &str, retention: &Retention) -> BackendResult<()> {
        let mut conn = self.conn.clone();
        let key = self.key(queue, set);
        let cutoff = now_ms() - retention.age.as_millis() as i64;

        let expired: Vec<String> = conn.zrangebyscore(&key, "-inf", cutoff).await?;
        let mut doomed: HashSet<String> = expired.into_iter().collect();

        let size: u64 = conn.zcard(&key).await?;
        if size > retention.count {
            let overflow = (size - retention.count) as isize;
            let oldest: Vec<String> = conn.zrange(&key, 0, overflow - 1).await?;
            doomed.extend(oldest);
        }

        if doomed.is_empty() {
            return Ok(());
        }

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for id in &doomed {
            pipe.zrem(&key, id).ignore();
            pipe.del(self.job_key(queue, id)).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        debug!(%queue, set, removed = doomed.len(), "Pruned finished jobs");
        Ok(())
    }
}

#[async_trait]
impl JobBackend for RedisBackend {
    async fn enqueue(&self, queue: &str, payload: serde_json::Value) -> BackendResult<Job> {
        let job = Job::new(queue, payload, self.policy.attempts);
        let data = serde_json::to_string(&job)?;
        let mut conn = self.conn.clone();

        let _: () = ::redis::pipe()
            .atomic()
            .set(self.job_key(queue, &job.id), data)
            .ignore()
            .lpush(self.key(queue, "wait"), &job.id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(job)
    }

    async fn claim(&self, queue: &str) -> BackendResult<Option<Job>> {
        let mut conn = self.conn.clone();
        let active = self.key(queue, "active");
        let id: Option<String> = conn
            .lmove(
                self.key(queue, "wait"),
                &active,
                Direction::Right,
                Direction::Left,
            )
            .await?;
        let Some(id) = id else {
            return Ok(None);
        };

        let data: Option<String> = conn.get(self.job_key(queue, &id)).await?;
        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => {
                warn!(%queue, job_id = %id, "Claimed job has no data, dropping it");
                let _: () = conn.lrem(&active, 1, &id).await?;
                Ok(None)
            }
        }
    }

    async fn complete(&self, job: &Job) -> BackendResult<()> {
        let mut conn = self.conn.clone();
        let _: () = ::redis::pipe()
            .atomic()
            .lrem(self.key(&job.queue, "active"), 1, &job.id)
            .ignore()
            .zadd(self.key(&job.queue, "completed"), &job.id, now_ms())
            .ignore()
            .query_async(&mut conn)
            .await?;

        self.prune(&job.queue, "completed", &self.policy.keep_completed)
            .await
    }

    async fn fail(&self, job: &Job, reason: &str, retryable: bool) -> BackendResult<FailOutcome> {
        let mut failed = job.clone();
        failed.attempts_made += 1;
        failed.failed_reason = Some(reason.to_string());
        self.store(&failed).await?;

        let outcome = self.policy.on_failure(&failed, retryable);
        let now = now_ms();
        let (target, score) = match outcome {
            FailOutcome::Retrying { delay } => ("delayed", now + delay.as_millis() as i64),
            FailOutcome::Failed => ("failed", now),
        };

        let mut conn = self.conn.clone();
        let _: () = ::redis::pipe()
            .atomic()
            .lrem(self.key(&job.queue, "active"), 1, &job.id)
            .ignore()
            .zadd(self.key(&job.queue, target), &job.id, score)
            .ignore()
            .query_async(&mut conn)
            .await?;

        if outcome == FailOutcome::Failed {
            self.prune(&job.queue, "failed", &self.policy.keep_failed)
                .await?;
        }
        Ok(outcome)
    }

    async fn promote_delayed(&self, queue: &str) -> BackendResult<usize> {
        let mut conn = self.conn.clone();
        let delayed = self.key(queue, "delayed");
        let due: Vec<String> = conn.zrangebyscore(&delayed, "-inf", now_ms()).await?;

        let mut promoted = 0;
        for id in due {
            // Only the caller whose ZREM wins pushes the job back.
            let removed: u64 = conn.zrem(&delayed, &id).await?;
            if removed == 1 {
                let _: () = conn.lpush(self.key(queue, "wait"), &id).await?;
                promoted += 1;
            }
        }
        Ok(promoted)
    }

    async fn counts(&self, queue: &str) -> BackendResult<QueueCounts> {
        let mut conn = self.conn.clone();
        let (waiting, active, delayed, completed, failed): (u64, u64, u64, u64, u64) =
            ::redis::pipe()
                .llen(self.key(queue, "wait"))
                .llen(self.key(queue, "active"))
                .zcard(self.key(queue, "delayed"))
                .zcard(self.key(queue, "completed"))
                .zcard(self.key(queue, "failed"))
                .query_async(&mut conn)
                .await?;

        Ok(QueueCounts {
            waiting,
            active,
            delayed,
            completed,
            failed,
        })
    }
}
