use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_api::{build_router, state::AppState};
use campus_config::Settings;
use campus_db::indexes::ensure_indexes;
use campus_queue::state::QueueState;
use campus_services::ServiceAuth;
use campus_services::mail::{MailError, MailOptions, MailTransport};
use mongodb::{Client, Database, options::ClientOptions};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};

/// Collects every mail handed to it instead of talking to an SMTP server.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<MailOptions>>,
}

impl RecordingTransport {
    pub async fn sent(&self) -> Vec<MailOptions> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, options: &MailOptions) -> Result<(), MailError> {
        self.sent.lock().await.push(options.clone());
        Ok(())
    }
}

/// A running web app, optionally backed by a running queue service, both on
/// their own MongoDB database.
pub struct TestApp {
    pub base_url: String,
    pub queue_base_url: Option<String>,
    pub db: Database,
    pub settings: Settings,
    pub state: AppState,
    pub queue: Option<QueueState>,
    pub client: reqwest::Client,
    pub mail: Arc<RecordingTransport>,
    cancel: watch::Sender<bool>,
}

impl TestApp {
    /// Spawn the web app and the queue service (in-memory backend).
    ///
    /// Requires a running MongoDB at localhost:27019.
    /// Set CAMPUS__DATABASE__URL env var to override the connection string.
    /// Each test gets a unique database name for isolation.
    pub async fn spawn() -> Self {
        Self::build(true, |_| {}).await
    }

    /// Spawn the web app pointed at a queue service that is not there, so
    /// every job takes the local fallback path.
    pub async fn spawn_without_queue() -> Self {
        Self::build(false, |s| {
            s.queue.server_url = "http://127.0.0.1:9".to_string();
            s.queue.request_timeout_ms = 500;
        })
        .await
    }

    /// Spawn both services with customized settings.
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        Self::build(true, mutator).await
    }

    async fn build(with_queue: bool, mutator: impl FnOnce(&mut Settings)) -> Self {
        let db_name = format!("campus_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        if let Ok(url) = std::env::var("CAMPUS__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();
        settings.queue.backend = "memory".to_string();
        settings.queue.poll_interval_ms = 20;
        settings.queue.backoff_ms = 10;
        settings.queue.sse_keep_alive_secs = 1;

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let mail = Arc::new(RecordingTransport::default());
        let (cancel, cancel_rx) = watch::channel(false);

        let (queue, queue_base_url) = if with_queue {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind queue port");
            let addr = listener.local_addr().unwrap();
            settings.queue.server_url = format!("http://{}", addr);
            mutator(&mut settings);

            let backend = campus_queue::backend::from_settings(&settings.queue, &settings.redis)
                .await
                .expect("Failed to create queue backend");
            let queue_state = QueueState::new(db.clone(), settings.clone(), backend);
            campus_queue::start_workers(&queue_state, mail.clone(), cancel_rx);

            let router = campus_queue::build_router(queue_state.clone());
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            (Some(queue_state), Some(format!("http://{}", addr)))
        } else {
            mutator(&mut settings);
            (None, None)
        };

        let state = AppState::new(db.clone(), settings.clone(), mail.clone())
            .expect("Failed to build app state");
        let app = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            queue_base_url,
            db,
            settings,
            state,
            queue,
            client: reqwest::Client::new(),
            mail,
            cancel,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn queue_url(&self, path: &str) -> String {
        let base = self
            .queue_base_url
            .as_ref()
            .expect("Queue service not running in this test app");
        format!("{}{}", base, path)
    }

    /// A token the queue service accepts from the web app.
    pub fn service_token(&self) -> String {
        ServiceAuth::new(&self.settings.queue)
            .issue()
            .expect("Failed to issue service token")
    }

    /// Waits until at least `count` mails were sent, up to five seconds.
    pub async fn wait_for_mail(&self, count: usize) -> Vec<MailOptions> {
        for _ in 0..100 {
            let sent = self.mail.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.mail.sent().await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: campus_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
            public_url: "http://localhost:3000".to_string(),
        },
        database: campus_config::DatabaseSettings {
            url: "mongodb://localhost:27019".to_string(),
            name: "campus_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        jwt: campus_config::JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604800,
            issuer: "campus".to_string(),
        },
        redis: campus_config::RedisSettings {
            url: "redis://127.0.0.1:6379".to_string(),
        },
        queue: campus_config::QueueSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            server_url: "http://127.0.0.1:4000".to_string(),
            jwt_secret: "test-queue-secret".to_string(),
            service_token_ttl_secs: 60,
            request_timeout_ms: 2000,
            backend: "memory".to_string(),
            key_prefix: "campus:test".to_string(),
            concurrency: 4,
            poll_interval_ms: 20,
            attempts: 3,
            backoff_ms: 10,
            completed_age_secs: 3600,
            completed_count: 100,
            failed_age_secs: 3600,
            failed_count: 100,
            sse_keep_alive_secs: 1,
            fanout_buffer: 64,
        },
        smtp: campus_config::SmtpSettings {
            host: "localhost".to_string(),
            port: 1025,
            secure: false,
            user: None,
            pass: None,
        },
        mail: campus_config::MailSettings {
            from: "Campus <no-reply@campus.test>".to_string(),
        },
        stripe: campus_config::StripeSettings {
            secret_key: String::new(),
            webhook_secret: "whsec_test".to_string(),
        },
    }
}
