use bson::{doc, oid::ObjectId};
use mongodb::Database;
use campus_db::models::{Community, Course, PaymentPlan};

use super::base::{BaseDao, DaoResult};

/// Read access to the purchasable entities and their plans.
pub struct CatalogDao {
    pub courses: BaseDao<Course>,
    pub communities: BaseDao<Community>,
    pub plans: BaseDao<PaymentPlan>,
}

impl CatalogDao {
    pub fn new(db: &Database) -> Self {
        Self {
            courses: BaseDao::new(db, Course::COLLECTION),
            communities: BaseDao::new(db, Community::COLLECTION),
            plans: BaseDao::new(db, PaymentPlan::COLLECTION),
        }
    }

    pub async fn find_course(&self, domain: ObjectId, course_id: &str) -> DaoResult<Option<Course>> {
        self.courses
            .find_one(doc! { "domain": domain, "course_id": course_id })
            .await
    }

    pub async fn find_community(
        &self,
        domain: ObjectId,
        community_id: &str,
    ) -> DaoResult<Option<Community>> {
        self.communities
            .find_one(doc! { "domain": domain, "community_id": community_id })
            .await
    }

    pub async fn find_plan(&self, domain: ObjectId, plan_id: &str) -> DaoResult<Option<PaymentPlan>> {
        self.plans
            .find_one(doc! { "domain": domain, "plan_id": plan_id })
            .await
    }
}
