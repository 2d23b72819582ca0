//! Turning a confirmed payment (or a free join) into access.

pub mod transition;

use std::sync::Arc;

use campus_db::models::{
    ActivityType, EntityType, Membership, PaymentPlan, Purchase, SequenceEvent,
};
use mongodb::Database;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dao::activity::ActivityDao;
use crate::dao::base::DaoError;
use crate::dao::catalog::CatalogDao;
use crate::dao::membership::MembershipDao;
use crate::dao::user::UserDao;
use crate::sequence::SequenceService;

pub use transition::{ActivationInput, Admission, PlanKind, Transition};

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("Community not found: {0}")]
    CommunityNotFound(String),
    #[error("Membership has no id")]
    Unsaved,
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub struct MembershipService {
    memberships: Arc<MembershipDao>,
    users: Arc<UserDao>,
    catalog: Arc<CatalogDao>,
    activities: ActivityDao,
    sequences: SequenceService,
}

impl MembershipService {
    pub fn new(
        db: &Database,
        memberships: Arc<MembershipDao>,
        users: Arc<UserDao>,
        catalog: Arc<CatalogDao>,
        sequences: SequenceService,
    ) -> Self {
        Self {
            memberships,
            users,
            catalog,
            activities: ActivityDao::new(db),
            sequences,
        }
    }

    /// Moves `membership` to its post-payment state and, when a plan is
    /// given and the status changed, finalizes the purchase. An already-active membership is
    /// returned unchanged with no side effects, as is one that a concurrent
    /// delivery activated first.
    pub async fn activate(
        &self,
        membership: Membership,
        plan: Option<&PaymentPlan>,
    ) -> Result<Membership, MembershipError> {
        if membership.is_active() {
            debug!(membership_id = ?membership.id, "Membership already active");
            return Ok(membership);
        }
        let id = membership.id.ok_or(MembershipError::Unsaved)?;

        let input = self.activation_input(&membership, plan).await?;
        let transition = input.resolve();

        let applied = self
            .memberships
            .apply_transition(id, transition.status, transition.role, transition.joining_reason)
            .await?;
        let updated = self.memberships.base.find_by_id(id).await?;
        if !applied {
            debug!(membership_id = %id, "Membership changed concurrently, skipping side effects");
            return Ok(updated);
        }

        info!(
            membership_id = %id,
            entity_type = ?updated.entity_type,
            status = ?updated.status,
            "Membership transitioned"
        );

        if updated.status == membership.status {
            debug!(membership_id = %id, "Membership still awaiting approval, nothing to finalize");
            return Ok(updated);
        }

        if let Some(plan) = plan {
            self.finalize_purchase(&updated, plan).await?;
        }

        Ok(updated)
    }

    async fn activation_input(
        &self,
        membership: &Membership,
        plan: Option<&PaymentPlan>,
    ) -> Result<ActivationInput, MembershipError> {
        let plan = PlanKind::of(plan);
        Ok(match membership.entity_type {
            EntityType::Course => ActivationInput::Course { plan },
            EntityType::Community => {
                let admission = match plan {
                    // Paid joins ignore the admission policy; skip the lookup.
                    PlanKind::Paid => Admission::Manual,
                    PlanKind::Free => {
                        let community = self
                            .catalog
                            .find_community(membership.domain, &membership.entity_id)
                            .await?
                            .ok_or_else(|| {
                                MembershipError::CommunityNotFound(membership.entity_id.clone())
                            })?;
                        Admission::from(community.auto_accept_members)
                    }
                };
                ActivationInput::Community { plan, admission }
            }
        })
    }

    /// Records activities, grants course access and fires sequences. A
    /// missing user ends finalization quietly: the payment has already gone
    /// through and there is nothing to roll back.
    pub async fn finalize_purchase(
        &self,
        membership: &Membership,
        plan: &PaymentPlan,
    ) -> Result<(), MembershipError> {
        let domain = membership.domain;
        let Some(user) = self
            .users
            .find_in_domain(domain, membership.user_id)
            .await?
        else {
            warn!(
                user_id = %membership.user_id,
                entity_id = %membership.entity_id,
                "User not found while finalizing purchase"
            );
            return Ok(());
        };
        let user_id = membership.user_id;

        if !plan.is_free() {
            self.activities
                .record(
                    domain,
                    user_id,
                    ActivityType::Purchased,
                    &membership.entity_id,
                    serde_json::json!({
                        "entity_type": membership.entity_type,
                        "payment_plan_id": plan.plan_id,
                        "amount_cents": plan.amount_cents,
                        "currency": plan.currency,
                    }),
                )
                .await?;
        }

        let event = match membership.entity_type {
            EntityType::Community => {
                self.activities
                    .record(
                        domain,
                        user_id,
                        ActivityType::CommunityJoined,
                        &membership.entity_id,
                        serde_json::Value::Null,
                    )
                    .await?;
                SequenceEvent::CommunityJoined
            }
            EntityType::Course => {
                match self.catalog.find_course(domain, &membership.entity_id).await? {
                    Some(course) => {
                        let purchase = Purchase {
                            course_id: course.course_id.clone(),
                            completed_lessons: Vec::new(),
                            accessible_groups: course.accessible_groups(),
                        };
                        if self.users.add_purchase(user_id, &purchase).await? {
                            debug!(%user_id, course_id = %course.course_id, "Course added to purchases");
                        }
                    }
                    None => {
                        warn!(course_id = %membership.entity_id, "Course not found while finalizing purchase");
                    }
                }
                self.activities
                    .record(
                        domain,
                        user_id,
                        ActivityType::ProductPurchased,
                        &membership.entity_id,
                        serde_json::Value::Null,
                    )
                    .await?;
                SequenceEvent::ProductPurchased
            }
        };

        self.sequences
            .trigger(domain, event, &membership.entity_id, &user)
            .await?;

        Ok(())
    }
}
