use bson::{DateTime, oid::ObjectId};
use mongodb::Database;
use campus_db::models::Notification;

use super::base::{BaseDao, DaoResult};

/// Fields for a notification that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub domain: ObjectId,
    pub user_id: String,
    pub for_user_id: String,
    pub entity_action: String,
    pub entity_id: String,
    pub entity_target_id: Option<String>,
}

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn create(&self, new: NewNotification) -> DaoResult<Notification> {
        let mut notification = Notification {
            id: None,
            domain: new.domain,
            user_id: new.user_id,
            for_user_id: new.for_user_id,
            entity_action: new.entity_action,
            entity_id: new.entity_id,
            entity_target_id: new.entity_target_id,
            created_at: DateTime::now(),
        };

        let id = self.base.insert_one(&notification).await?;
        notification.id = Some(id);
        Ok(notification)
    }
}
