use std::sync::Arc;

use async_trait::async_trait;
use campus_services::jobs::{NOTIFICATION_QUEUE, NotificationPayload};
use tracing::debug;

use super::{JobError, JobHandler};
use crate::backend::Job;
use crate::fanout::NotificationBroker;

/// Hands stored notifications to whoever is listening for the recipient.
pub struct NotificationWorker {
    broker: Arc<NotificationBroker>,
}

impl NotificationWorker {
    pub fn new(broker: Arc<NotificationBroker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl JobHandler for NotificationWorker {
    fn queue(&self) -> &'static str {
        NOTIFICATION_QUEUE
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: NotificationPayload = serde_json::from_value(job.payload.clone())?;
        let notification_id = payload.id.clone();
        let recipient = payload.for_user_id.clone();

        let delivered = self.broker.publish(payload);
        debug!(%notification_id, %recipient, delivered, "Notification fanned out");
        Ok(())
    }
}
