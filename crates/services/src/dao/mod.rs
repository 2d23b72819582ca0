pub mod activity;
pub mod base;
pub mod catalog;
pub mod domain;
pub mod membership;
pub mod notification;
pub mod sequence;
pub mod user;

pub use base::BaseDao;
