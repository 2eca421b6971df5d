use anyhow::{bail, Context, Result};

/// Deployment posture. Signature verification on the inbound webhook is
/// mandatory in production and skipped in development, where requests are
/// hand-crafted with curl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    Production,
    Development,
}

impl Posture {
    fn from_env() -> Result<Self> {
        match std::env::var("APP_ENV").as_deref() {
            Ok("production") => Ok(Posture::Production),
            Ok("development") | Err(_) => Ok(Posture::Development),
            Ok(other) => bail!("APP_ENV must be 'production' or 'development', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub posture: Posture,
    /// External base URL of this service, used to reconstruct the exact URL
    /// the messaging provider signed and to build deep links.
    pub public_base_url: String,
    /// Shared secret for webhook signatures. Required in production.
    pub webhook_auth_token: Option<String>,
    pub classifier_api_url: String,
    pub classifier_api_key: String,
    pub messaging_api_url: String,
    pub messaging_account_sid: String,
    pub messaging_auth_token: String,
    /// Sender address for outbound notifications, e.g. `whatsapp:+3197...`.
    pub messaging_from_address: String,
    pub worker_count: usize,
    pub queue_capacity: usize,
    /// Calibration constant for per-phase progress estimation.
    pub expected_docs_per_phase: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let posture = Posture::from_env()?;
        let webhook_auth_token = std::env::var("WEBHOOK_AUTH_TOKEN").ok();
        if posture == Posture::Production && webhook_auth_token.is_none() {
            bail!("WEBHOOK_AUTH_TOKEN is required when APP_ENV=production");
        }

        Ok(Config {
            posture,
            public_base_url: require_env("PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            webhook_auth_token,
            classifier_api_url: require_env("CLASSIFIER_API_URL")?,
            classifier_api_key: require_env("CLASSIFIER_API_KEY")?,
            messaging_api_url: require_env("MESSAGING_API_URL")?,
            messaging_account_sid: require_env("MESSAGING_ACCOUNT_SID")?,
            messaging_auth_token: require_env("MESSAGING_AUTH_TOKEN")?,
            messaging_from_address: require_env("MESSAGING_FROM_ADDRESS")?,
            worker_count: std::env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "4".to_string())
                .parse::<usize>()
                .context("WORKER_COUNT must be a positive integer")?,
            queue_capacity: std::env::var("QUEUE_CAPACITY")
                .unwrap_or_else(|_| "256".to_string())
                .parse::<usize>()
                .context("QUEUE_CAPACITY must be a positive integer")?,
            expected_docs_per_phase: std::env::var("EXPECTED_DOCS_PER_PHASE")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<f64>()
                .context("EXPECTED_DOCS_PER_PHASE must be a number")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
