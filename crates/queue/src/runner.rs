//! Worker runner: polls one queue and executes its jobs under a bounded
//! number of permits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use crate::backend::{FailOutcome, JobBackend};
use crate::workers::JobHandler;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WorkerRunner {
    backend: Arc<dyn JobBackend>,
    handler: Arc<dyn JobHandler>,
    concurrency: u32,
    poll_interval: Duration,
}

impl WorkerRunner {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        handler: Arc<dyn JobHandler>,
        concurrency: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            handler,
            concurrency: concurrency.max(1),
            poll_interval,
        }
    }

    /// Runs until `cancel` flips to `true`, then waits for in-flight jobs.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let queue = self.handler.queue();
        info!(
            %queue,
            concurrency = self.concurrency,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency as usize));

        loop {
            if *cancel.borrow() {
                break;
            }

            // Not raced against cancel: a claimed job must reach a handler.
            if self.poll_and_execute(&semaphore).await {
                continue;
            }

            tokio::select! {
                _ = cancel.changed() => break,
                _ = time::sleep(self.poll_interval) => {}
            }
        }

        info!(%queue, "Worker waiting for in-flight jobs");
        if !drain(&semaphore, self.concurrency, DRAIN_TIMEOUT).await {
            let in_flight = (self.concurrency as usize).saturating_sub(semaphore.available_permits());
            warn!(
                %queue,
                in_flight,
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "Drain timed out with jobs still running"
            );
        }
        info!(%queue, "Worker stopped");
    }

    /// Claims and spawns at most one job. Returns whether a job was claimed.
    async fn poll_and_execute(&self, semaphore: &Arc<Semaphore>) -> bool {
        let queue = self.handler.queue();
        let Ok(permit) = semaphore.clone().try_acquire_owned() else {
            trace!(%queue, "All worker slots occupied");
            return false;
        };

        let job = match self.backend.claim(queue).await {
            Ok(Some(job)) => job,
            Ok(None) => return false,
            Err(e) => {
                error!(%queue, "Failed to claim job: {}", e);
                return false;
            }
        };

        let backend = Arc::clone(&self.backend);
        let handler = Arc::clone(&self.handler);

        tokio::spawn(async move {
            let _permit = permit;
            debug!(
                %queue,
                job_id = %job.id,
                attempt = job.attempts_made + 1,
                max_attempts = job.max_attempts,
                "Processing job"
            );

            match handler.handle(&job).await {
                Ok(()) => {
                    if let Err(e) = backend.complete(&job).await {
                        error!(%queue, job_id = %job.id, "Failed to mark job completed: {}", e);
                    }
                }
                Err(err) => {
                    let reason = err.to_string();
                    match backend.fail(&job, &reason, err.is_retryable()).await {
                        Ok(FailOutcome::Retrying { delay }) => {
                            warn!(
                                %queue,
                                job_id = %job.id,
                                retry_in_ms = delay.as_millis() as u64,
                                "Job failed, will retry: {}",
                                reason
                            );
                        }
                        Ok(FailOutcome::Failed) => {
                            error!(%queue, job_id = %job.id, "Job failed permanently: {}", reason);
                        }
                        Err(e) => {
                            error!(%queue, job_id = %job.id, "Failed to record job failure: {}", e);
                        }
                    }
                }
            }
        });

        true
    }
}

/// Waits until all `permits` are free again. Returns `false` on timeout.
async fn drain(semaphore: &Semaphore, permits: u32, timeout: Duration) -> bool {
    matches!(
        time::timeout(timeout, semaphore.acquire_many(permits)).await,
        Ok(Ok(_))
    )
}

/// Periodically moves due retries back to their waiting lists.
pub async fn run_promoter(
    backend: Arc<dyn JobBackend>,
    queues: Vec<&'static str>,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.changed() => break,
            _ = ticker.tick() => {
                for queue in &queues {
                    match backend.promote_delayed(queue).await {
                        Ok(0) => {}
                        Ok(n) => debug!(%queue, promoted = n, "Promoted delayed jobs"),
                        Err(e) => error!(%queue, "Failed to promote delayed jobs: {}", e),
                    }
                }
            }
        }
    }
}
