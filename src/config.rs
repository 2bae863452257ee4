use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::InitError;

const DEFAULT_URI: &str = "mongodb://localhost:27017/";
const DEFAULT_DATABASE: &str = "geolocalizacao";
const DEFAULT_APP_USER: &str = "app_user";
const DEFAULT_APP_PASSWORD: &str = "app_password";
const DEFAULT_COLLECTION: &str = "locais";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for one bootstrap run.
///
/// With nothing set in the environment every field carries the same literal
/// the container init script always used.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub mongodb_uri: String,
    pub database: String,
    pub app_user: String,
    pub app_password: String,
    pub collection: String,
    pub sample_places_path: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl BootstrapConfig {
    /// Load settings from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self> {
        // A missing `.env` is fine in containers.
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = lookup("MONGODB_ADMIN_URI")
            .or_else(|| lookup("MONGODB_CONNECTION_STRING"))
            .unwrap_or_else(|| DEFAULT_URI.to_string());

        let config = Self {
            mongodb_uri,
            database: lookup("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            app_user: lookup("MONGODB_APP_USER").unwrap_or_else(|| DEFAULT_APP_USER.to_string()),
            app_password: lookup("MONGODB_APP_PASSWORD")
                .unwrap_or_else(|| DEFAULT_APP_PASSWORD.to_string()),
            collection: lookup("MONGODB_PLACES_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            sample_places_path: lookup("SAMPLE_PLACES_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            connect_timeout: Duration::from_secs(
                lookup("MONGODB_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), InitError> {
        let required = [
            ("MONGODB_DATABASE", &self.database),
            ("MONGODB_APP_USER", &self.app_user),
            ("MONGODB_APP_PASSWORD", &self.app_password),
            ("MONGODB_PLACES_COLLECTION", &self.collection),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(InitError::InvalidConfig(format!("{} must not be empty", key)));
            }
        }

        // MongoDB forbids these in database names.
        if self.database.contains(['/', '\\', '.', ' ', '"', '$']) {
            return Err(InitError::InvalidConfig(format!(
                "'{}' is not a valid database name",
                self.database
            )));
        }

        Ok(())
    }
}
