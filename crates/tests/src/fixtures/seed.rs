use bson::{DateTime, doc, oid::ObjectId};
use campus_db::models::{
    Activity, Community, Course, CourseGroup, EntityType, Membership, Notification, PaymentPlan,
    PlanType, Sequence, SequenceEmail, SequenceEvent, SequenceStatus, SequenceTrigger, User,
};
use futures::TryStreamExt;
use serde_json::Value;

use super::test_app::TestApp;

pub struct SeededUser {
    pub id: ObjectId,
    pub domain: ObjectId,
    pub email: String,
    pub username: String,
    pub access_token: String,
}

impl TestApp {
    /// Register a user in `domain` and return their auth info.
    pub async fn register_user(&self, domain: &str, email: &str, username: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "domain": domain,
                "email": email,
                "username": username,
                "display_name": username,
                "password": "Password123!",
            }))
            .send()
            .await
            .expect("Register request failed");

        assert_eq!(resp.status().as_u16(), 201, "Register failed");
        let json: Value = resp.json().await.expect("Failed to parse register response");

        SeededUser {
            id: ObjectId::parse_str(json["user"]["id"].as_str().unwrap()).unwrap(),
            domain: ObjectId::parse_str(json["user"]["domain"].as_str().unwrap()).unwrap(),
            email: email.to_string(),
            username: username.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
        }
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    /// POST to the queue service with a valid service token.
    pub fn service_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.queue_url(path))
            .header("Authorization", format!("Bearer {}", self.service_token()))
    }

    pub async fn seed_course(&self, domain: ObjectId, course_id: &str, groups: Vec<CourseGroup>) {
        let now = DateTime::now();
        self.db
            .collection::<Course>(Course::COLLECTION)
            .insert_one(Course {
                id: None,
                domain,
                course_id: course_id.to_string(),
                title: format!("Course {course_id}"),
                creator_id: ObjectId::new(),
                groups,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("Failed to seed course");
    }

    pub async fn seed_community(&self, domain: ObjectId, community_id: &str, auto_accept: bool) {
        let now = DateTime::now();
        self.db
            .collection::<Community>(Community::COLLECTION)
            .insert_one(Community {
                id: None,
                domain,
                community_id: community_id.to_string(),
                name: format!("Community {community_id}"),
                auto_accept_members: auto_accept,
                default_payment_plan_id: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("Failed to seed community");
    }

    pub async fn seed_plan(
        &self,
        domain: ObjectId,
        plan_id: &str,
        entity_type: EntityType,
        entity_id: &str,
        plan_type: PlanType,
    ) -> PaymentPlan {
        let plan = PaymentPlan {
            id: None,
            domain,
            plan_id: plan_id.to_string(),
            name: format!("Plan {plan_id}"),
            plan_type,
            entity_id: entity_id.to_string(),
            entity_type,
            amount_cents: if plan_type == PlanType::Free { 0 } else { 4900 },
            currency: "usd".to_string(),
            created_at: DateTime::now(),
        };
        self.db
            .collection::<PaymentPlan>(PaymentPlan::COLLECTION)
            .insert_one(&plan)
            .await
            .expect("Failed to seed payment plan");
        plan
    }

    /// An active sequence with one published welcome mail.
    pub async fn seed_sequence(
        &self,
        domain: ObjectId,
        event: SequenceEvent,
        entity_id: Option<&str>,
        subject: &str,
    ) -> ObjectId {
        let result = self
            .db
            .collection::<Sequence>(Sequence::COLLECTION)
            .insert_one(Sequence {
                id: None,
                domain,
                title: subject.to_string(),
                status: SequenceStatus::Active,
                trigger: SequenceTrigger {
                    event,
                    entity_id: entity_id.map(str::to_string),
                },
                emails: vec![
                    SequenceEmail {
                        email_id: "draft".to_string(),
                        subject: "Never sent".to_string(),
                        content: "<p>draft</p>".to_string(),
                        published: false,
                    },
                    SequenceEmail {
                        email_id: "welcome".to_string(),
                        subject: subject.to_string(),
                        content: "<p>Welcome aboard</p>".to_string(),
                        published: true,
                    },
                ],
                entrants: vec![],
                created_at: DateTime::now(),
            })
            .await
            .expect("Failed to seed sequence");
        result.inserted_id.as_object_id().unwrap()
    }

    /// A pending membership written straight to the database.
    pub async fn seed_pending_membership(
        &self,
        domain: ObjectId,
        user_id: ObjectId,
        entity_type: EntityType,
        entity_id: &str,
        plan_id: &str,
    ) -> Membership {
        self.state
            .memberships
            .find_or_create_pending(domain, entity_type, entity_id, user_id, plan_id, None)
            .await
            .expect("Failed to seed membership")
    }

    pub async fn activities(&self, user_id: ObjectId) -> Vec<Activity> {
        self.db
            .collection::<Activity>(Activity::COLLECTION)
            .find(doc! { "user_id": user_id })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }

    pub async fn notifications_for(&self, for_user_id: &str) -> Vec<Notification> {
        self.db
            .collection::<Notification>(Notification::COLLECTION)
            .find(doc! { "for_user_id": for_user_id })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }

    pub async fn user(&self, user_id: ObjectId) -> User {
        self.state.users.base.find_by_id(user_id).await.unwrap()
    }

    pub async fn sequence(&self, id: ObjectId) -> Sequence {
        self.db
            .collection::<Sequence>(Sequence::COLLECTION)
            .find_one(doc! { "_id": id })
            .await
            .unwrap()
            .unwrap()
    }
}
