pub mod auth;
pub mod job;
pub mod membership;
pub mod payment;
