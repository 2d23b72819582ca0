use bson::oid::ObjectId;
use campus_config::StripeSettings;
use campus_db::models::{Membership, PaymentPlan};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dao::base::DaoError;
use crate::dao::catalog::CatalogDao;
use crate::dao::membership::MembershipDao;
use crate::membership::{MembershipError, MembershipService};

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Stripe API error: {0}")]
    ApiError(String),
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Invalid webhook metadata: {0}")]
    InvalidMetadata(String),
    #[error(transparent)]
    Activation(#[from] MembershipError),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub struct PaymentService {
    settings: StripeSettings,
    client: reqwest::Client,
}

impl PaymentService {
    pub fn new(settings: &StripeSettings) -> Self {
        Self {
            settings: settings.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Opens a one-off checkout for `plan`. The membership and plan ids ride
    /// along as metadata and come back on `checkout.session.completed`.
    pub async fn create_checkout_session(
        &self,
        membership: &Membership,
        plan: &PaymentPlan,
        email: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutResponse, PaymentError> {
        let membership_id = membership
            .id
            .map(|id| id.to_hex())
            .ok_or_else(|| PaymentError::InvalidMetadata("membership has no id".into()))?;
        let amount = plan.amount_cents.to_string();

        let params = [
            ("mode", "payment"),
            ("customer_email", email),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", plan.currency.as_str()),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            ("line_items[0][price_data][product_data][name]", plan.name.as_str()),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", membership.session_id.as_str()),
            ("metadata[membership_id]", membership_id.as_str()),
            ("metadata[payment_plan_id]", plan.plan_id.as_str()),
        ];

        let resp: serde_json::Value = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.settings.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::ApiError(e.to_string()))?
            .json()
            .await
            .map_err(|e| PaymentError::ApiError(e.to_string()))?;

        if let Some(err) = resp.get("error") {
            return Err(PaymentError::ApiError(
                err["message"]
                    .as_str()
                    .unwrap_or("Unknown Stripe error")
                    .to_string(),
            ));
        }

        let url = resp["url"]
            .as_str()
            .ok_or_else(|| PaymentError::ApiError("No checkout URL in response".to_string()))?
            .to_string();

        info!(%membership_id, plan_id = %plan.plan_id, "Checkout session created");
        Ok(CheckoutResponse { url })
    }

    /// Verify the Stripe webhook signature using HMAC-SHA256.
    pub fn verify_signature(
        webhook_secret: &str,
        payload: &[u8],
        sig_header: &str,
    ) -> Result<(), PaymentError> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        // t=...,v1=...,v0=...
        let mut timestamp = None;
        let mut signatures: Vec<&str> = Vec::new();
        for part in sig_header.split(',') {
            let part = part.trim();
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t);
            } else if let Some(v1) = part.strip_prefix("v1=") {
                signatures.push(v1);
            }
        }

        let timestamp = timestamp.ok_or(PaymentError::InvalidSignature)?;
        if signatures.is_empty() {
            return Err(PaymentError::InvalidSignature);
        }

        let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| PaymentError::InvalidSignature)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        if signatures.iter().any(|s| *s == expected) {
            Ok(())
        } else {
            Err(PaymentError::InvalidSignature)
        }
    }

    /// Activates the membership named in a completed checkout. Redelivered
    /// events are harmless: activation is a no-op on an active membership.
    pub async fn handle_webhook_event(
        &self,
        event: &StripeEvent,
        memberships: &MembershipDao,
        catalog: &CatalogDao,
        activation: &MembershipService,
    ) -> Result<(), PaymentError> {
        let obj = &event.data.object;

        match event.event_type.as_str() {
            "checkout.session.completed" => {
                let membership_hex = obj["metadata"]["membership_id"].as_str().unwrap_or_default();
                let plan_id = obj["metadata"]["payment_plan_id"].as_str().unwrap_or_default();

                if membership_hex.is_empty() {
                    warn!("checkout.session.completed missing membership_id metadata");
                    return Ok(());
                }

                let membership_id = ObjectId::parse_str(membership_hex).map_err(|_| {
                    PaymentError::InvalidMetadata(format!("membership_id {membership_hex}"))
                })?;
                let membership = memberships.base.find_by_id(membership_id).await?;
                let plan = catalog.find_plan(membership.domain, plan_id).await?;
                if plan.is_none() {
                    warn!(%plan_id, %membership_id, "Payment plan in checkout metadata not found");
                }

                let membership = activation.activate(membership, plan.as_ref()).await?;
                info!(
                    %membership_id,
                    status = ?membership.status,
                    "Membership activated via checkout"
                );
            }

            other => {
                info!(event_type = %other, "Unhandled Stripe webhook event");
            }
        }

        Ok(())
    }
}
