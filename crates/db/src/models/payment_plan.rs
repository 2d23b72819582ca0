use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::membership::EntityType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlan {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub plan_id: String,
    pub name: String,
    pub plan_type: PlanType,
    pub entity_id: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub amount_cents: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Free,
    OneTime,
    Subscription,
    Emi,
}

fn default_currency() -> String {
    "usd".to_string()
}

impl PaymentPlan {
    pub const COLLECTION: &'static str = "payment_plans";

    pub fn is_free(&self) -> bool {
        self.plan_type == PlanType::Free
    }
}
