pub mod activity;
pub mod community;
pub mod course;
pub mod domain;
pub mod membership;
pub mod notification;
pub mod payment_plan;
pub mod sequence;
pub mod user;

pub use activity::{Activity, ActivityType};
pub use community::Community;
pub use course::{Course, CourseGroup, Drip};
pub use domain::Domain;
pub use membership::{EntityType, Membership, MembershipRole, MembershipStatus};
pub use notification::Notification;
pub use payment_plan::{PaymentPlan, PlanType};
pub use sequence::{Sequence, SequenceEmail, SequenceEvent, SequenceStatus, SequenceTrigger};
pub use user::{Purchase, User};
