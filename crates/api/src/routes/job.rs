use axum::{Json, extract::State};
use campus_services::jobs::NotificationRequest;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

/// A notification raised by the caller. Actor and domain come from the token.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub for_user_ids: Vec<String>,
    #[validate(length(min = 1))]
    pub entity_action: String,
    #[validate(length(min = 1))]
    pub entity_id: String,
    #[serde(default)]
    pub entity_target_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: &'static str,
}

pub async fn add_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NotifyRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    body.validate()?;

    state
        .queue
        .add_notification(NotificationRequest {
            domain: auth.domain.to_hex(),
            user_id: auth.user_id.to_hex(),
            for_user_ids: body.for_user_ids,
            entity_action: body.entity_action,
            entity_id: body.entity_id,
            entity_target_id: body.entity_target_id,
        })
        .await?;

    Ok(Json(SuccessResponse { message: "Success" }))
}
