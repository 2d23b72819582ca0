//! Outgoing mail: the job shape carried on the queue, the options handed to
//! a transport, and the transport seam itself.

mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

pub use smtp::SmtpTransport;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A mail request as it travels to and through the queue.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct MailJob {
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
}

/// What a transport actually sends. `to` is a single header value.
#[derive(Debug, Clone, PartialEq)]
pub struct MailOptions {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl MailOptions {
    /// Fills in the default sender and joins the recipients into one
    /// comma-separated header.
    pub fn from_job(job: &MailJob, default_from: &str) -> Self {
        Self {
            from: job
                .from
                .clone()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| default_from.to_string()),
            to: job.to.join(", "),
            subject: job.subject.clone(),
            html: job.body.clone(),
        }
    }

    /// Options addressed to a single recipient of `job`.
    pub fn for_recipient(job: &MailJob, recipient: &str, default_from: &str) -> Self {
        Self {
            to: recipient.to_string(),
            ..Self::from_job(job, default_from)
        }
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, options: &MailOptions) -> Result<(), MailError>;
}
