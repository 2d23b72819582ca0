use std::sync::Arc;

use async_trait::async_trait;
use campus_services::jobs::MAIL_QUEUE;
use campus_services::mail::{MailJob, MailOptions, MailTransport};
use tracing::{error, info};

use super::{JobError, JobHandler};
use crate::backend::Job;

/// Sends one mail per job. Failures go back to the queue for retry.
pub struct MailWorker {
    transport: Arc<dyn MailTransport>,
    default_from: String,
}

impl MailWorker {
    pub fn new(transport: Arc<dyn MailTransport>, default_from: impl Into<String>) -> Self {
        Self {
            transport,
            default_from: default_from.into(),
        }
    }
}

#[async_trait]
impl JobHandler for MailWorker {
    fn queue(&self) -> &'static str {
        MAIL_QUEUE
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let mail: MailJob = serde_json::from_value(job.payload.clone())?;
        let options = MailOptions::from_job(&mail, &self.default_from);

        if let Err(e) = self.transport.send(&options).await {
            error!(job_id = %job.id, to = %options.to, "Mail send failed: {}", e);
            return Err(e.into());
        }

        info!(job_id = %job.id, to = %options.to, subject = %options.subject, "Mail sent");
        Ok(())
    }
}
