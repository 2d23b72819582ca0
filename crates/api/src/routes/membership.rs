use axum::{Json, extract::State};
use campus_db::models::{EntityType, Membership, MembershipRole, MembershipStatus};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    pub entity_type: EntityType,
    #[validate(length(min = 1))]
    pub entity_id: String,
    #[validate(length(min = 1))]
    pub payment_plan_id: String,
    #[serde(default)]
    pub joining_reason: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub status: MembershipStatus,
    pub role: Option<MembershipRole>,
    pub joining_reason: Option<String>,
}

impl MembershipResponse {
    fn from_membership(m: Membership) -> Result<Self, ApiError> {
        let id = m
            .id
            .ok_or_else(|| ApiError::Internal("Membership has no id".to_string()))?;
        Ok(Self {
            id: id.to_hex(),
            entity_type: m.entity_type,
            entity_id: m.entity_id,
            status: m.status,
            role: m.role,
            joining_reason: m.joining_reason,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JoinResponse {
    Membership { membership: MembershipResponse },
    Checkout { checkout_url: String },
}

/// Free plans activate on the spot; paid plans hand back a checkout URL and
/// activate once the payment webhook arrives.
pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    body.validate()?;

    let plan = state
        .catalog
        .find_plan(auth.domain, &body.payment_plan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment plan not found".to_string()))?;
    if plan.entity_id != body.entity_id || plan.entity_type != body.entity_type {
        return Err(ApiError::BadRequest(
            "Payment plan does not belong to this entity".to_string(),
        ));
    }

    let exists = match body.entity_type {
        EntityType::Course => state
            .catalog
            .find_course(auth.domain, &body.entity_id)
            .await?
            .is_some(),
        EntityType::Community => state
            .catalog
            .find_community(auth.domain, &body.entity_id)
            .await?
            .is_some(),
    };
    if !exists {
        return Err(ApiError::NotFound(format!(
            "{:?} {} not found",
            body.entity_type, body.entity_id
        )));
    }

    let membership = state
        .memberships
        .find_or_create_pending(
            auth.domain,
            body.entity_type,
            &body.entity_id,
            auth.user_id,
            &plan.plan_id,
            body.joining_reason,
        )
        .await?;

    if membership.is_active() {
        return Ok(Json(JoinResponse::Membership {
            membership: MembershipResponse::from_membership(membership)?,
        }));
    }

    if plan.is_free() {
        let membership = state.membership.activate(membership, Some(&plan)).await?;
        info!(
            user_id = %auth.user_id,
            entity_id = %body.entity_id,
            status = ?membership.status,
            "Joined with free plan"
        );
        return Ok(Json(JoinResponse::Membership {
            membership: MembershipResponse::from_membership(membership)?,
        }));
    }

    let base = state.settings.app.public_url.trim_end_matches('/');
    let success_url = body
        .success_url
        .unwrap_or_else(|| format!("{base}/checkout/success"));
    let cancel_url = body
        .cancel_url
        .unwrap_or_else(|| format!("{base}/checkout/cancel"));

    let checkout = state
        .payments
        .create_checkout_session(&membership, &plan, &auth.email, &success_url, &cancel_url)
        .await?;

    Ok(Json(JoinResponse::Checkout {
        checkout_url: checkout.url,
    }))
}
