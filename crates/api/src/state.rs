use std::sync::Arc;

use campus_config::Settings;
use campus_services::queue_client::QueueClientError;
use campus_services::{
    AuthService, JobQueueClient, MailTransport, MembershipService, PaymentService, SequenceService,
    dao::{
        catalog::CatalogDao, domain::DomainDao, membership::MembershipDao,
        notification::NotificationDao, user::UserDao,
    },
};
use mongodb::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub domains: Arc<DomainDao>,
    pub catalog: Arc<CatalogDao>,
    pub memberships: Arc<MembershipDao>,
    pub membership: Arc<MembershipService>,
    pub queue: Arc<JobQueueClient>,
    pub payments: Arc<PaymentService>,
}

impl AppState {
    /// `transport` is only used when the queue service cannot take a mail
    /// job and it has to be sent from here.
    pub fn new(
        db: Database,
        settings: Settings,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, QueueClientError> {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let domains = Arc::new(DomainDao::new(&db));
        let catalog = Arc::new(CatalogDao::new(&db));
        let memberships = Arc::new(MembershipDao::new(&db));
        let queue = Arc::new(JobQueueClient::new(
            &settings.queue,
            &settings.mail,
            transport,
            Arc::new(NotificationDao::new(&db)),
        )?);
        let sequences = SequenceService::new(&db, Arc::clone(&queue));
        let membership = Arc::new(MembershipService::new(
            &db,
            Arc::clone(&memberships),
            Arc::clone(&users),
            Arc::clone(&catalog),
            sequences,
        ));
        let payments = Arc::new(PaymentService::new(&settings.stripe));

        Ok(Self {
            db,
            settings,
            auth,
            users,
            domains,
            catalog,
            memberships,
            membership,
            queue,
            payments,
        })
    }
}
