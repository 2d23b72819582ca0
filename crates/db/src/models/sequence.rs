use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A series of mails sent to users who hit a trigger event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: ObjectId,
    pub title: String,
    #[serde(default)]
    pub status: SequenceStatus,
    pub trigger: SequenceTrigger,
    #[serde(default)]
    pub emails: Vec<SequenceEmail>,
    #[serde(default)]
    pub entrants: Vec<ObjectId>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    #[default]
    Draft,
    Active,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceTrigger {
    pub event: SequenceEvent,
    /// Restricts the trigger to one course/community; `None` matches any.
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SequenceEvent {
    CommunityJoined,
    ProductPurchased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEmail {
    pub email_id: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

impl Sequence {
    pub const COLLECTION: &'static str = "sequences";

    pub fn first_published_email(&self) -> Option<&SequenceEmail> {
        self.emails.iter().find(|e| e.published)
    }
}
