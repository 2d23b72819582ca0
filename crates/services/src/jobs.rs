//! Wire shapes shared by the queue client and the queue service.

use bson::oid::ObjectId;
use campus_db::models::Notification;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dao::notification::NewNotification;

pub const MAIL_QUEUE: &str = "mail";
pub const NOTIFICATION_QUEUE: &str = "notification";

/// Body of `POST /job/notification`: one actor, many recipients.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub domain: String,
    pub user_id: String,
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub for_user_ids: Vec<String>,
    #[validate(length(min = 1))]
    pub entity_action: String,
    #[validate(length(min = 1))]
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_target_id: Option<String>,
}

impl NotificationRequest {
    /// Expands the request into one record per recipient, in request order.
    /// User ids are opaque; only the domain has to be an ObjectId.
    pub fn to_new_notifications(&self) -> Result<Vec<NewNotification>, String> {
        let domain = ObjectId::parse_str(&self.domain)
            .map_err(|_| format!("Invalid domain: {}", self.domain))?;

        Ok(self
            .for_user_ids
            .iter()
            .map(|recipient| NewNotification {
                domain,
                user_id: self.user_id.clone(),
                for_user_id: recipient.clone(),
                entity_action: self.entity_action.clone(),
                entity_id: self.entity_id.clone(),
                entity_target_id: self.entity_target_id.clone(),
            })
            .collect())
    }
}

/// A stored notification as carried on the notification queue and through
/// the fan-out broker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub id: String,
    pub domain: String,
    pub user_id: String,
    pub for_user_id: String,
    pub entity_action: String,
    pub entity_id: String,
    #[serde(default)]
    pub entity_target_id: Option<String>,
    pub created_at: i64,
}

impl TryFrom<&Notification> for NotificationPayload {
    type Error = String;

    fn try_from(n: &Notification) -> Result<Self, Self::Error> {
        let id = n.id.ok_or_else(|| "notification has not been stored".to_string())?;
        Ok(Self {
            id: id.to_hex(),
            domain: n.domain.to_hex(),
            user_id: n.user_id.clone(),
            for_user_id: n.for_user_id.clone(),
            entity_action: n.entity_action.clone(),
            entity_id: n.entity_id.clone(),
            entity_target_id: n.entity_target_id.clone(),
            created_at: n.created_at.timestamp_millis(),
        })
    }
}
