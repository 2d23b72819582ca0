use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use campus_db::models::{Purchase, User};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        domain: ObjectId,
        email: String,
        username: String,
        display_name: String,
        password_hash: String,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            domain,
            email,
            username,
            display_name,
            password_hash: Some(password_hash),
            purchases: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, domain: ObjectId, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "domain": domain, "email": email })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_in_domain(&self, domain: ObjectId, user_id: ObjectId) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "_id": user_id, "domain": domain })
            .await
    }

    /// Appends a course purchase unless the user already holds one for the
    /// same course. The check and the push happen in one update, so
    /// concurrent activations cannot double-append.
    pub async fn add_purchase(&self, user_id: ObjectId, purchase: &Purchase) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! {
                    "_id": user_id,
                    "purchases.course_id": { "$ne": &purchase.course_id },
                },
                doc! {
                    "$push": { "purchases": bson::to_bson(purchase)? },
                    "$set": {},
                },
            )
            .await
    }
}
