use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use campus_db::models::{EntityType, Membership, MembershipRole, MembershipStatus};
use uuid::Uuid;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct MembershipDao {
    pub base: BaseDao<Membership>,
}

impl MembershipDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Membership::COLLECTION),
        }
    }

    pub async fn find_for(
        &self,
        domain: ObjectId,
        entity_type: EntityType,
        entity_id: &str,
        user_id: ObjectId,
    ) -> DaoResult<Option<Membership>> {
        self.base
            .find_one(doc! {
                "domain": domain,
                "entity_type": bson::to_bson(&entity_type)?,
                "entity_id": entity_id,
                "user_id": user_id,
            })
            .await
    }

    /// Returns the user's membership for the entity, creating a pending one
    /// if none exists. A fresh session id is issued on every call so a new
    /// checkout can be told apart from an earlier abandoned one.
    pub async fn find_or_create_pending(
        &self,
        domain: ObjectId,
        entity_type: EntityType,
        entity_id: &str,
        user_id: ObjectId,
        payment_plan_id: &str,
        joining_reason: Option<String>,
    ) -> DaoResult<Membership> {
        let session_id = Uuid::new_v4().to_string();

        if let Some(existing) = self.find_for(domain, entity_type, entity_id, user_id).await? {
            if existing.is_active() {
                return Ok(existing);
            }
            let id = existing.id.ok_or(DaoError::NotFound)?;
            let mut set = doc! {
                "session_id": &session_id,
                "payment_plan_id": payment_plan_id,
            };
            if let Some(reason) = &joining_reason {
                set.insert("joining_reason", reason);
            }
            self.base.update_by_id(id, doc! { "$set": set }).await?;
            return self.base.find_by_id(id).await;
        }

        let now = DateTime::now();
        let membership = Membership {
            id: None,
            domain,
            entity_id: entity_id.to_string(),
            entity_type,
            user_id,
            status: MembershipStatus::Pending,
            role: None,
            joining_reason,
            session_id,
            payment_plan_id: Some(payment_plan_id.to_string()),
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&membership).await?;
        self.base.find_by_id(id).await
    }

    /// Writes the outcome of an activation. Only a membership that is not yet
    /// active is touched; `false` means another delivery got there first.
    pub async fn apply_transition(
        &self,
        id: ObjectId,
        status: MembershipStatus,
        role: Option<MembershipRole>,
        joining_reason: Option<&str>,
    ) -> DaoResult<bool> {
        let mut set = doc! { "status": bson::to_bson(&status)? };
        if let Some(role) = role {
            set.insert("role", bson::to_bson(&role)?);
        }
        if let Some(reason) = joining_reason {
            set.insert("joining_reason", reason);
        }

        self.base
            .update_one(
                doc! {
                    "_id": id,
                    "status": { "$ne": bson::to_bson(&MembershipStatus::Active)? },
                },
                doc! { "$set": set },
            )
            .await
    }
}
