use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use campus_db::models::{Activity, ActivityType};

use super::base::{BaseDao, DaoResult};

pub struct ActivityDao {
    pub base: BaseDao<Activity>,
}

impl ActivityDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Activity::COLLECTION),
        }
    }

    pub async fn record(
        &self,
        domain: ObjectId,
        user_id: ObjectId,
        activity_type: ActivityType,
        entity_id: &str,
        metadata: serde_json::Value,
    ) -> DaoResult<ObjectId> {
        let activity = Activity {
            id: None,
            domain,
            user_id,
            activity_type,
            entity_id: entity_id.to_string(),
            metadata,
            created_at: DateTime::now(),
        };
        self.base.insert_one(&activity).await
    }

    pub async fn list_for_user(&self, domain: ObjectId, user_id: ObjectId) -> DaoResult<Vec<Activity>> {
        self.base
            .find_many(
                doc! { "domain": domain, "user_id": user_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }
}
