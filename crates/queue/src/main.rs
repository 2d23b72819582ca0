use std::sync::Arc;

use campus_config::Settings;
use campus_db::{connect, indexes::ensure_indexes};
use campus_queue::{backend, build_router, start_workers, state::QueueState};
use campus_services::SmtpTransport;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "campus_queue=debug,campus_services=debug,campus_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!(
        backend = %settings.queue.backend,
        concurrency = settings.queue.concurrency,
        attempts = settings.queue.attempts,
        "Starting campus queue on {}:{}",
        settings.queue.host,
        settings.queue.port
    );

    let db = connect(&settings.database).await?;
    ensure_indexes(&db).await?;

    let backend = backend::from_settings(&settings.queue, &settings.redis).await?;
    let transport = Arc::new(SmtpTransport::new(&settings.smtp)?);
    let state = QueueState::new(db, settings.clone(), backend);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let workers = start_workers(&state, transport, cancel_rx);

    let app = build_router(state);
    let addr = format!("{}:{}", settings.queue.host, settings.queue.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stopping workers");
    cancel_tx.send(true).ok();
    for handle in workers {
        if let Err(e) = handle.await {
            warn!("Worker task ended abnormally: {}", e);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
