use axum::{Json, extract::State};
use campus_services::jobs::{
    MAIL_QUEUE, NOTIFICATION_QUEUE, NotificationPayload, NotificationRequest,
};
use campus_services::mail::MailJob;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::backend::QueueCounts;
use crate::{error::ApiError, extractors::ServiceCaller, state::QueueState};

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub message: &'static str,
}

impl Accepted {
    fn success() -> Json<Self> {
        Json(Self { message: "Success" })
    }
}

pub async fn add_mail(
    State(state): State<QueueState>,
    _caller: ServiceCaller,
    Json(body): Json<MailJob>,
) -> Result<Json<Accepted>, ApiError> {
    body.validate()?;

    let payload = serde_json::to_value(&body).map_err(|e| ApiError::Internal(e.to_string()))?;
    let job = state.backend.enqueue(MAIL_QUEUE, payload).await?;

    info!(job_id = %job.id, recipients = body.to.len(), "Mail job queued");
    Ok(Accepted::success())
}

/// Stores one notification per recipient and queues each for fan-out.
pub async fn add_notification(
    State(state): State<QueueState>,
    _caller: ServiceCaller,
    Json(body): Json<NotificationRequest>,
) -> Result<Json<Accepted>, ApiError> {
    body.validate()?;
    let records = body.to_new_notifications().map_err(ApiError::BadRequest)?;

    for record in records {
        let notification = state.notifications.create(record).await?;
        let payload = NotificationPayload::try_from(&notification).map_err(ApiError::Internal)?;
        let value = serde_json::to_value(&payload).map_err(|e| ApiError::Internal(e.to_string()))?;
        state.backend.enqueue(NOTIFICATION_QUEUE, value).await?;
    }

    info!(
        actor = %body.user_id,
        recipients = body.for_user_ids.len(),
        action = %body.entity_action,
        "Notifications queued"
    );
    Ok(Accepted::success())
}

#[derive(Debug, Serialize)]
pub struct QueueStats {
    pub mail: QueueCounts,
    pub notification: QueueCounts,
}

pub async fn stats(
    State(state): State<QueueState>,
    _caller: ServiceCaller,
) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(QueueStats {
        mail: state.backend.counts(MAIL_QUEUE).await?,
        notification: state.backend.counts(NOTIFICATION_QUEUE).await?,
    }))
}
