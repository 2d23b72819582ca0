use bson::{DateTime, doc};
use mongodb::{Database, options::ReturnDocument};
use campus_db::models::Domain;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct DomainDao {
    pub base: BaseDao<Domain>,
}

impl DomainDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Domain::COLLECTION),
        }
    }

    pub async fn find_by_name(&self, name: &str) -> DaoResult<Domain> {
        self.base
            .find_one(doc! { "name": name })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_or_create(&self, name: &str) -> DaoResult<Domain> {
        self.base
            .collection()
            .find_one_and_update(
                doc! { "name": name },
                doc! { "$setOnInsert": { "name": name, "created_at": DateTime::now() } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(DaoError::NotFound)
    }
}
