pub mod backend;
pub mod error;
pub mod extractors;
pub mod fanout;
pub mod routes;
pub mod runner;
pub mod state;
pub mod workers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use campus_services::MailTransport;
use campus_services::jobs::{MAIL_QUEUE, NOTIFICATION_QUEUE};
use state::QueueState;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::runner::{WorkerRunner, run_promoter};
use crate::workers::{JobHandler, MailWorker, NotificationWorker};

pub fn build_router(state: QueueState) -> Router {
    // SSE is consumed straight from browsers.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let job_routes = Router::new()
        .route("/mail", post(routes::job::add_mail))
        .route("/notification", post(routes::job::add_notification))
        .route("/stats", get(routes::job::stats));

    Router::new()
        .route("/", get(routes::health::index))
        .nest("/job", job_routes)
        .route("/sse/{user_id}", get(routes::sse::stream))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Spawns the mail and notification workers plus the delayed-job promoter.
/// All of them stop once `cancel` flips to `true`.
pub fn start_workers(
    state: &QueueState,
    transport: Arc<dyn MailTransport>,
    cancel: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let queue = &state.settings.queue;
    let poll_interval = Duration::from_millis(queue.poll_interval_ms);

    let handlers: Vec<Arc<dyn JobHandler>> = vec![
        Arc::new(MailWorker::new(transport, state.settings.mail.from.clone())),
        Arc::new(NotificationWorker::new(Arc::clone(&state.broker))),
    ];

    let mut handles: Vec<JoinHandle<()>> = handlers
        .into_iter()
        .map(|handler| {
            let runner = WorkerRunner::new(
                Arc::clone(&state.backend),
                handler,
                queue.concurrency,
                poll_interval,
            );
            let cancel = cancel.clone();
            tokio::spawn(async move { runner.run(cancel).await })
        })
        .collect();

    handles.push(tokio::spawn(run_promoter(
        Arc::clone(&state.backend),
        vec![MAIL_QUEUE, NOTIFICATION_QUEUE],
        poll_interval,
        cancel,
    )));

    handles
}
