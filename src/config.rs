use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_SECRET_KEY: &str = "default-fallback-key";

/// Connection parameters for the inventory store, handed to the gateway once at startup.
#[derive(Clone)]
pub struct StoreSettings {
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub store: StoreSettings,
    pub secret_key: String,
    pub region: String,
    pub model_id: Option<String>,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store", &self.store)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("model_id", &self.model_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. `from_env` is the
    /// process-environment case; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let store = StoreSettings {
            host: required("RDS_ENDPOINT")?,
            database: required("RDS_DB_NAME")?,
            username: required("RDS_USERNAME")?,
            password: lookup("RDS_PASSWORD").unwrap_or_default(),
            port: lookup("RDS_PORT")
                .unwrap_or_else(|| "5432".to_string())
                .parse()
                .context("RDS_PORT must be a valid port number")?,
            connect_timeout: Duration::from_secs(
                lookup("DB_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|| "5".to_string())
                    .parse()
                    .context("DB_CONNECT_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        };

        let secret_key = match lookup("SECRET_KEY") {
            Some(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("SECRET_KEY not set, using the built-in fallback key");
                DEFAULT_SECRET_KEY.to_string()
            }
        };

        Ok(Self {
            store,
            secret_key,
            region: lookup("AWS_REGION").unwrap_or_else(|| "unknown".to_string()),
            model_id: lookup("BEDROCK_MODEL_ID").filter(|id| !id.is_empty()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
        })
    }
}
