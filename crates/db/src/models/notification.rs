use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Something an actor did that another user should hear about. Written once,
/// never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    /// Actor, as the caller names it
    pub user_id: String,
    /// Recipient, as the caller names it
    pub for_user_id: String,
    pub entity_action: String,
    pub entity_id: String,
    pub entity_target_id: Option<String>,
    pub created_at: DateTime,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}
