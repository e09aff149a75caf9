//! Configuration management

use std::time::Duration;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_ASSIGNMENT_PATH, DEFAULT_CATALOG_PATH, DEFAULT_LOG_FILTER,
    DEFAULT_REFRESH_PATH, DEFAULT_REQUEST_TIMEOUT_SECS, USER_ID_PLACEHOLDER,
};
use crate::types::UserId;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub telemetry: TelemetrySettings,
}

/// Remote store endpoints and transport limits.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub catalog_path: String,
    /// Must contain `{user_id}`.
    pub assignment_path: String,
    pub refresh_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub filter: String,
    pub json: bool,
    /// Directory for daily rolling log files; stdout only when unset.
    pub log_dir: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            assignment_path: DEFAULT_ASSIGNMENT_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: true,
            log_dir: None,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn assignment_path_for(&self, user_id: UserId) -> String {
        self.assignment_path
            .replace(USER_ID_PLACEHOLDER, &user_id.to_string())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("ACCESS")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    /// Applies built-in defaults under `builder`'s sources and validates.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config = builder
            .set_default("api.base_url", DEFAULT_API_BASE_URL)?
            .set_default("api.timeout_seconds", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("api.catalog_path", DEFAULT_CATALOG_PATH)?
            .set_default("api.assignment_path", DEFAULT_ASSIGNMENT_PATH)?
            .set_default("api.refresh_path", DEFAULT_REFRESH_PATH)?
            .set_default("telemetry.filter", DEFAULT_LOG_FILTER)?
            .set_default("telemetry.json", true)?
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        if !config.api.assignment_path.contains(USER_ID_PLACEHOLDER) {
            return Err(ConfigError::Message(format!(
                "api.assignment_path must contain {}",
                USER_ID_PLACEHOLDER
            )));
        }
        Ok(config)
    }
}
