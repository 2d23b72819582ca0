//! Job handlers, one per queue.

pub mod mail;
pub mod notification;

use async_trait::async_trait;
use campus_services::mail::MailError;
use thiserror::Error;

use crate::backend::Job;

pub use mail::MailWorker;
pub use notification::NotificationWorker;

#[derive(Debug, Error)]
pub enum JobError {
    /// The payload can never be processed. Not retried.
    #[error("Malformed job payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),
}

impl JobError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, JobError::Payload(_))
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Queue this handler consumes.
    fn queue(&self) -> &'static str;

    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}
