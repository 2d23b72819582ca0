use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub email: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Courses the user has access to, in purchase order. One entry per course.
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    pub course_id: String,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub accessible_groups: Vec<String>,
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn has_purchased(&self, course_id: &str) -> bool {
        self.purchases.iter().any(|p| p.course_id == course_id)
    }
}
