use secrecy::Secret;
use serde::Deserialize;

/// Fires at minute zero of every eighth hour.
pub const DEFAULT_RECONCILIATION_SCHEDULE: &str = "0 0 */8 * * *";
pub const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Session tokens for the login profiles
    pub jwt_secret: Secret<String>,

    // Payment gateway. Each entry is optional at load time; the gateway
    // session reports what is missing the first time it tries to log in.
    pub payment_url: Option<String>,
    pub payment_username: Option<String>,
    pub payment_password: Option<Secret<String>>,
    pub payment_timeout_secs: u64,

    // Cron expression (with seconds) for the pending-payment sweep
    pub reconciliation_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            jwt_secret: Secret::new(config.get("jwt_secret")?),

            payment_url: config.get("payment_url").ok(),
            payment_username: config.get("payment_username").ok(),
            payment_password: config
                .get::<String>("payment_password")
                .ok()
                .map(Secret::new),
            payment_timeout_secs: config
                .get("payment_timeout_secs")
                .unwrap_or(DEFAULT_PAYMENT_TIMEOUT_SECS),

            reconciliation_schedule: config
                .get("reconciliation_schedule")
                .unwrap_or_else(|_| DEFAULT_RECONCILIATION_SCHEDULE.to_string()),
        })
    }
}
