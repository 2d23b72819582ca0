use std::sync::Arc;

use campus_config::Settings;
use campus_services::ServiceAuth;
use campus_services::dao::notification::NotificationDao;
use mongodb::Database;

use crate::backend::JobBackend;
use crate::fanout::NotificationBroker;

#[derive(Clone)]
pub struct QueueState {
    pub settings: Settings,
    pub backend: Arc<dyn JobBackend>,
    pub broker: Arc<NotificationBroker>,
    pub notifications: Arc<NotificationDao>,
    pub service_auth: Arc<ServiceAuth>,
}

impl QueueState {
    pub fn new(db: Database, settings: Settings, backend: Arc<dyn JobBackend>) -> Self {
        let broker = Arc::new(NotificationBroker::new(settings.queue.fanout_buffer));
        let notifications = Arc::new(NotificationDao::new(&db));
        let service_auth = Arc::new(ServiceAuth::new(&settings.queue));

        Self {
            settings,
            backend,
            broker,
            notifications,
            service_auth,
        }
    }
}
