use bson::{doc, oid::ObjectId};
use mongodb::Database;
use campus_db::models::{Sequence, SequenceEvent, SequenceStatus};

use super::base::{BaseDao, DaoResult};

pub struct SequenceDao {
    pub base: BaseDao<Sequence>,
}

impl SequenceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Sequence::COLLECTION),
        }
    }

    /// Active sequences listening for `event`, either on any entity or on
    /// `entity_id` specifically.
    pub async fn find_triggered(
        &self,
        domain: ObjectId,
        event: SequenceEvent,
        entity_id: &str,
    ) -> DaoResult<Vec<Sequence>> {
        self.base
            .find_many(
                doc! {
                    "domain": domain,
                    "status": bson::to_bson(&SequenceStatus::Active)?,
                    "trigger.event": bson::to_bson(&event)?,
                    "$or": [
                        { "trigger.entity_id": null },
                        { "trigger.entity_id": entity_id },
                    ],
                },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    /// Adds the user to the sequence. Returns `false` if they were already in.
    pub async fn add_entrant(&self, sequence_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": sequence_id, "entrants": { "$ne": user_id } },
                doc! { "$push": { "entrants": user_id } },
            )
            .await
    }
}
