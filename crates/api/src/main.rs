use std::sync::Arc;

use campus_api::{build_router, state::AppState};
use campus_config::Settings;
use campus_db::{connect, indexes::ensure_indexes};
use campus_services::SmtpTransport;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "campus_api=debug,campus_services=debug,campus_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting campus API on {}:{}", settings.app.host, settings.app.port);
    info!(queue = %settings.queue.server_url, "Job queue endpoint");

    let db = connect(&settings.database).await?;
    ensure_indexes(&db).await?;

    // Fallback path for mail the queue service cannot accept.
    let transport = Arc::new(SmtpTransport::new(&settings.smtp)?);
    let app_state = AppState::new(db, settings.clone(), transport)?;

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
