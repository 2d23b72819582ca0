use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{
    Activity, Community, Course, Domain, Membership, Notification, PaymentPlan, Sequence, User,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Domains
    create_indexes(
        db,
        Domain::COLLECTION,
        vec![index_unique(bson::doc! { "name": 1 })],
    )
    .await?;

    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "domain": 1, "email": 1 }),
            index_unique(bson::doc! { "domain": 1, "username": 1 }),
        ],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        Notification::COLLECTION,
        vec![
            index(bson::doc! { "for_user_id": 1, "created_at": -1 }),
            index(bson::doc! { "domain": 1, "for_user_id": 1 }),
        ],
    )
    .await?;

    // Memberships
    create_indexes(
        db,
        Membership::COLLECTION,
        vec![
            index_unique(bson::doc! { "domain": 1, "entity_type": 1, "entity_id": 1, "user_id": 1 }),
            index(bson::doc! { "domain": 1, "user_id": 1, "status": 1 }),
            index(bson::doc! { "session_id": 1 }),
        ],
    )
    .await?;

    // Courses
    create_indexes(
        db,
        Course::COLLECTION,
        vec![index_unique(bson::doc! { "domain": 1, "course_id": 1 })],
    )
    .await?;

    // Communities
    create_indexes(
        db,
        Community::COLLECTION,
        vec![index_unique(bson::doc! { "domain": 1, "community_id": 1 })],
    )
    .await?;

    // Payment plans
    create_indexes(
        db,
        PaymentPlan::COLLECTION,
        vec![
            index_unique(bson::doc! { "domain": 1, "plan_id": 1 }),
            index(bson::doc! { "domain": 1, "entity_type": 1, "entity_id": 1 }),
        ],
    )
    .await?;

    // Activities
    create_indexes(
        db,
        Activity::COLLECTION,
        vec![
            index(bson::doc! { "domain": 1, "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "domain": 1, "activity_type": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Sequences
    create_indexes(
        db,
        Sequence::COLLECTION,
        vec![index(bson::doc! { "domain": 1, "status": 1, "trigger.event": 1 })],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
