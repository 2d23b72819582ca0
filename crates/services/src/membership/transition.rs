use campus_db::models::{MembershipRole, MembershipStatus, PaymentPlan};

pub const AUTO_ACCEPTED_REASON: &str = "Auto accepted";

/// What the buyer paid with, as far as activation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Free,
    Paid,
}

impl PlanKind {
    /// No plan at all counts as paid: activation then follows the
    /// unconditional branch.
    pub fn of(plan: Option<&PaymentPlan>) -> Self {
        match plan {
            Some(plan) if plan.is_free() => PlanKind::Free,
            _ => PlanKind::Paid,
        }
    }
}

/// How a community treats free joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    AutoAccept,
    Manual,
}

impl From<bool> for Admission {
    fn from(auto_accept_members: bool) -> Self {
        if auto_accept_members {
            Admission::AutoAccept
        } else {
            Admission::Manual
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationInput {
    Course { plan: PlanKind },
    Community { plan: PlanKind, admission: Admission },
}

/// Target state of a membership after a confirmed payment or free join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: MembershipStatus,
    /// `None` leaves the stored role untouched.
    pub role: Option<MembershipRole>,
    /// `None` keeps the member's own joining reason.
    pub joining_reason: Option<&'static str>,
}

impl ActivationInput {
    pub fn resolve(self) -> Transition {
        match self {
            ActivationInput::Course { plan: _ } => Transition {
                status: MembershipStatus::Active,
                role: None,
                joining_reason: None,
            },
            ActivationInput::Community {
                plan: PlanKind::Free,
                admission: Admission::AutoAccept,
            } => Transition {
                status: MembershipStatus::Active,
                role: Some(MembershipRole::Post),
                joining_reason: Some(AUTO_ACCEPTED_REASON),
            },
            ActivationInput::Community {
                plan: PlanKind::Free,
                admission: Admission::Manual,
            } => Transition {
                status: MembershipStatus::Pending,
                role: Some(MembershipRole::Comment),
                joining_reason: None,
            },
            ActivationInput::Community {
                plan: PlanKind::Paid,
                admission: _,
            } => Transition {
                status: MembershipStatus::Active,
                role: Some(MembershipRole::Post),
                joining_reason: None,
            },
        }
    }
}
