use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use campus_services::PaymentService;
use campus_services::payment::StripeEvent;

use crate::{error::ApiError, state::AppState};

/// `POST /api/payment/webhook`: no auth, raw body, Stripe signature.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let sig_header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    PaymentService::verify_signature(&state.settings.stripe.webhook_secret, &body, sig_header)?;

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid event payload: {e}")))?;

    state
        .payments
        .handle_webhook_event(&event, &state.memberships, &state.catalog, &state.membership)
        .await?;

    Ok(StatusCode::OK)
}
