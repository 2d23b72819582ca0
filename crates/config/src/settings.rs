use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub redis: RedisSettings,
    pub queue: QueueSettings,
    pub smtp: SmtpSettings,
    pub mail: MailSettings,
    pub stripe: StripeSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Base URL browsers use to reach the web app; checkout redirects land here.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

/// Queue service: both the listener side (`host`/`port`, workers) and the
/// client side (`server_url`, service token) read from here.
#[derive(Debug, Deserialize, Clone)]
pub struct QueueSettings {
    pub host: String,
    pub port: u16,
    pub server_url: String,
    pub jwt_secret: String,
    pub service_token_ttl_secs: u64,
    pub request_timeout_ms: u64,
    /// `redis` or `memory`
    pub backend: String,
    pub key_prefix: String,
    pub concurrency: u32,
    pub poll_interval_ms: u64,
    pub attempts: u32,
    pub backoff_ms: u64,
    pub completed_age_secs: u64,
    pub completed_count: u64,
    pub failed_age_secs: u64,
    pub failed_count: u64,
    pub sse_keep_alive_secs: u64,
    pub fanout_buffer: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("CAMPUS"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("app.public_url", "http://localhost:3000")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "campus")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "campus")?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("queue.host", "0.0.0.0")?
            .set_default("queue.port", 4000)?
            .set_default("queue.server_url", "http://localhost:4000")?
            .set_default("queue.jwt_secret", "change-me-queue-secret")?
            .set_default("queue.service_token_ttl_secs", 60)?
            .set_default("queue.request_timeout_ms", 5000)?
            .set_default("queue.backend", "redis")?
            .set_default("queue.key_prefix", "campus:queue")?
            .set_default("queue.concurrency", 5)?
            .set_default("queue.poll_interval_ms", 500)?
            .set_default("queue.attempts", 3)?
            .set_default("queue.backoff_ms", 1000)?
            .set_default("queue.completed_age_secs", 86400)?
            .set_default("queue.completed_count", 1000)?
            .set_default("queue.failed_age_secs", 604800)?
            .set_default("queue.failed_count", 5000)?
            .set_default("queue.sse_keep_alive_secs", 15)?
            .set_default("queue.fanout_buffer", 64)?
            .set_default("smtp.host", "localhost")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.secure", false)?
            .set_default("smtp.user", None::<String>)?
            .set_default("smtp.pass", None::<String>)?
            .set_default("mail.from", "Campus <no-reply@campus.local>")?
            .set_default("stripe.secret_key", "")?
            .set_default("stripe.webhook_secret", "")?
            .build()?;

        config.try_deserialize()
    }
}
