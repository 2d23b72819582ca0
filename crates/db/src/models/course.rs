use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub course_id: String,
    pub title: String,
    pub creator_id: ObjectId,
    #[serde(default)]
    pub groups: Vec<CourseGroup>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseGroup {
    pub id: String,
    pub name: String,
    pub drip: Option<Drip>,
}

/// Delayed release of a group, either relative to purchase or on a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drip {
    pub delay_in_millis: Option<i64>,
    pub date: Option<DateTime>,
}

impl Course {
    pub const COLLECTION: &'static str = "courses";

    /// Groups available right after purchase: anything not drip-released.
    pub fn accessible_groups(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| g.drip.is_none())
            .map(|g| g.id.clone())
            .collect()
    }
}
