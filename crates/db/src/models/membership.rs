use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A user's standing in a course or community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub user_id: ObjectId,
    #[serde(default)]
    pub status: MembershipStatus,
    pub role: Option<MembershipRole>,
    pub joining_reason: Option<String>,
    pub session_id: String,
    pub payment_plan_id: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Course,
    Community,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    Pending,
    Active,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    /// Can comment on existing posts only.
    Comment,
    /// Can create posts and comment.
    Post,
    Moderate,
}

impl Membership {
    pub const COLLECTION: &'static str = "memberships";

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}
