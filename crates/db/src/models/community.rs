use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub community_id: String,
    pub name: String,
    #[serde(default)]
    pub auto_accept_members: bool,
    pub default_payment_plan_id: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Community {
    pub const COLLECTION: &'static str = "communities";
}
