//! Configuration loader with environment variable expansion

use super::{
    default_invalid_email, default_invalid_password, Config, ConfigError, CredentialsConfig,
    LoggingConfig, ServiceConfig,
};
use std::path::Path;

pub const ENV_BASE_URL: &str = "PETFRIENDS_BASE_URL";
pub const ENV_EMAIL: &str = "PETFRIENDS_EMAIL";
pub const ENV_PASSWORD: &str = "PETFRIENDS_PASSWORD";
pub const ENV_INVALID_EMAIL: &str = "PETFRIENDS_INVALID_EMAIL";
pub const ENV_INVALID_PASSWORD: &str = "PETFRIENDS_INVALID_PASSWORD";
pub const ENV_TIMEOUT: &str = "PETFRIENDS_TIMEOUT_SECONDS";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    ///
    /// `${VAR}` placeholders are expanded per string value after parsing, so
    /// substituted values never pass through YAML quoting or escapes.
    pub fn from_yaml(content: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from `PETFRIENDS_*` environment variables.
    ///
    /// `PETFRIENDS_EMAIL` and `PETFRIENDS_PASSWORD` are required; everything
    /// else falls back to defaults.
    pub fn from_env() -> Result<Config, ConfigError> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
        };

        let mut service = ServiceConfig::default();
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            service.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
            let seconds = timeout.parse::<u64>().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT, timeout
                ))
            })?;
            service.timeout_seconds = Some(seconds);
        }

        let config = Config {
            service,
            credentials: CredentialsConfig {
                valid_email: required(ENV_EMAIL)?,
                valid_password: required(ENV_PASSWORD)?,
                invalid_email: std::env::var(ENV_INVALID_EMAIL)
                    .unwrap_or_else(|_| default_invalid_email()),
                invalid_password: std::env::var(ENV_INVALID_PASSWORD)
                    .unwrap_or_else(|_| default_invalid_password()),
            },
            logging: LoggingConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}
