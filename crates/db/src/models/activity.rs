use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub user_id: ObjectId,
    pub activity_type: ActivityType,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Purchased,
    CommunityJoined,
    ProductPurchased,
}

impl Activity {
    pub const COLLECTION: &'static str = "activities";
}
