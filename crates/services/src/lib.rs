pub mod auth;
pub mod dao;
pub mod jobs;
pub mod mail;
pub mod membership;
pub mod payment;
pub mod queue_client;
pub mod sequence;

pub use auth::{AuthService, ServiceAuth};
pub use mail::{MailJob, MailTransport, SmtpTransport};
pub use membership::MembershipService;
pub use payment::PaymentService;
pub use queue_client::JobQueueClient;
pub use sequence::SequenceService;
