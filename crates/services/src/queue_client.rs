//! Hands mail and notifications to the queue service, degrading to local
//! delivery when the service cannot take them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_config::{MailSettings, QueueSettings};
use campus_db::models::Notification;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use validator::Validate;

use crate::auth::{AuthError, ServiceAuth};
use crate::dao::base::DaoError;
use crate::dao::notification::{NewNotification, NotificationDao};
use crate::jobs::NotificationRequest;
use crate::mail::{MailJob, MailOptions, MailTransport};

#[derive(Debug, Error)]
pub enum QueueClientError {
    #[error("Validation: {0}")]
    Validation(String),
    #[error("Delivery failed for all {0} recipient(s)")]
    AllRecipientsFailed(usize),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where notifications land when the queue service is unavailable.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn persist(&self, new: NewNotification) -> Result<Notification, DaoError>;
}

#[async_trait]
impl NotificationSink for NotificationDao {
    async fn persist(&self, new: NewNotification) -> Result<Notification, DaoError> {
        self.create(new).await
    }
}

/// At-least-once client for the queue service. A request the service
/// rejects or never receives is delivered locally instead, so a retry by
/// the caller can produce duplicates.
pub struct JobQueueClient {
    http: reqwest::Client,
    server_url: String,
    service_auth: ServiceAuth,
    transport: Arc<dyn MailTransport>,
    notifications: Arc<dyn NotificationSink>,
    default_from: String,
}

impl JobQueueClient {
    pub fn new(
        queue: &QueueSettings,
        mail: &MailSettings,
        transport: Arc<dyn MailTransport>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Result<Self, QueueClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(queue.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            server_url: queue.server_url.trim_end_matches('/').to_string(),
            service_auth: ServiceAuth::new(queue),
            transport,
            notifications,
            default_from: mail.from.clone(),
        })
    }

    pub async fn send_mail(&self, job: MailJob) -> Result<(), QueueClientError> {
        job.validate()
            .map_err(|e| QueueClientError::Validation(e.to_string()))?;

        match self.post_job("/job/mail", &job).await {
            Ok(()) => Ok(()),
            Err(reason) => {
                error!(%reason, recipients = job.to.len(), "Mail enqueue failed, sending directly");
                self.send_mail_directly(&job).await
            }
        }
    }

    pub async fn add_notification(&self, request: NotificationRequest) -> Result<(), QueueClientError> {
        request
            .validate()
            .map_err(|e| QueueClientError::Validation(e.to_string()))?;
        let records = request
            .to_new_notifications()
            .map_err(QueueClientError::Validation)?;

        match self.post_job("/job/notification", &request).await {
            Ok(()) => Ok(()),
            Err(reason) => {
                error!(%reason, recipients = records.len(), "Notification enqueue failed, persisting directly");
                self.persist_directly(records).await
            }
        }
    }

    async fn post_job<T: Serialize>(&self, path: &str, body: &T) -> Result<(), String> {
        let token = self.service_auth.issue().map_err(|e| e.to_string())?;
        let response = self
            .http
            .post(format!("{}{}", self.server_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() {
            debug!(path, "Job accepted by queue service");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(format!("queue service responded {status}: {text}"))
        }
    }

    /// One send per recipient so a bad address cannot sink the others.
    async fn send_mail_directly(&self, job: &MailJob) -> Result<(), QueueClientError> {
        let mut failed = 0;
        for recipient in &job.to {
            let options = MailOptions::for_recipient(job, recipient, &self.default_from);
            if let Err(e) = self.transport.send(&options).await {
                warn!(%recipient, error = %e, "Direct mail send failed");
                failed += 1;
            }
        }

        if failed == job.to.len() {
            return Err(QueueClientError::AllRecipientsFailed(failed));
        }
        Ok(())
    }

    async fn persist_directly(&self, records: Vec<NewNotification>) -> Result<(), QueueClientError> {
        let total = records.len();
        let mut failed = 0;
        for record in records {
            let for_user_id = record.for_user_id.clone();
            if let Err(e) = self.notifications.persist(record).await {
                warn!(%for_user_id, error = %e, "Direct notification persist failed");
                failed += 1;
            }
        }

        if failed == total {
            return Err(QueueClientError::AllRecipientsFailed(failed));
        }
        Ok(())
    }
}
