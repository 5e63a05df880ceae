//! Configuration module for the PetFriends client
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation. Configuration can also be
//! assembled directly from `PETFRIENDS_*` environment variables.

use crate::models::Credentials;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Public PetFriends deployment
pub const DEFAULT_BASE_URL: &str = "https://petfriends.skillfactory.ru/";

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = env_var_pattern();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default: leave the placeholder untouched
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

fn env_var_pattern() -> &'static regex_lite::Regex {
    static PATTERN: std::sync::OnceLock<regex_lite::Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}")
            .expect("static env var pattern is valid")
    })
}

/// Custom deserializer for strings with environment variable expansion.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
pub(crate) fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// A value still carrying `${...}` was never expanded
fn is_unexpanded(value: &str) -> bool {
    value.contains("${")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Missing environment variable: {0}")]
    MissingVar(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Build configuration from `PETFRIENDS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigLoader::from_env()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.service.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid base_url '{}': must start with http:// or https://",
                self.service.base_url
            )));
        }

        if self.service.timeout_seconds == Some(0) {
            return Err(ConfigError::ValidationError(
                "timeout_seconds must be greater than zero when set".into(),
            ));
        }

        let creds = &self.credentials;
        for (field, value) in [
            ("valid_email", &creds.valid_email),
            ("valid_password", &creds.valid_password),
            ("invalid_email", &creds.invalid_email),
            ("invalid_password", &creds.invalid_password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "credentials.{} cannot be empty",
                    field
                )));
            }
            if is_unexpanded(value) {
                return Err(ConfigError::ValidationError(format!(
                    "credentials.{} references an unset environment variable: {}",
                    field, value
                )));
            }
        }

        if creds.invalid_email == creds.valid_email {
            return Err(ConfigError::ValidationError(
                "credentials.invalid_email must differ from valid_email".into(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level '{}': must be 'trace', 'debug', 'info', 'warn', or 'error'",
                    other
                )))
            }
        }

        Ok(())
    }
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the PetFriends deployment. Supports ${VAR} expansion.
    #[serde(
        default = "default_base_url",
        deserialize_with = "deserialize_with_env"
    )]
    pub base_url: String,

    /// Request timeout in seconds. Default: none (transport default)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ServiceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Account credentials used by the suite.
///
/// The "invalid" pair is only ever used in negative authentication checks.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(deserialize_with = "deserialize_with_env")]
    pub valid_email: String,

    #[serde(deserialize_with = "deserialize_with_env")]
    pub valid_password: String,

    #[serde(
        default = "default_invalid_email",
        deserialize_with = "deserialize_with_env"
    )]
    pub invalid_email: String,

    #[serde(
        default = "default_invalid_password",
        deserialize_with = "deserialize_with_env"
    )]
    pub invalid_password: String,
}

impl CredentialsConfig {
    /// Account that is expected to authenticate
    pub fn valid(&self) -> Credentials {
        Credentials::new(&self.valid_email, &self.valid_password)
    }

    /// Unknown email paired with the real password
    pub fn invalid_email(&self) -> Credentials {
        Credentials::new(&self.invalid_email, &self.valid_password)
    }

    /// Real email paired with a wrong password
    pub fn invalid_password(&self) -> Credentials {
        Credentials::new(&self.valid_email, &self.invalid_password)
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("valid_email", &self.valid_email)
            .field("valid_password", &"***")
            .field("invalid_email", &self.invalid_email)
            .field("invalid_password", &"***")
            .finish()
    }
}

pub(crate) fn default_invalid_email() -> String {
    "nobody@example.invalid".to_string()
}

pub(crate) fn default_invalid_password() -> String {
    "wrong-password".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset. Default: "info"
    #[serde(
        default = "default_log_level",
        deserialize_with = "deserialize_with_env"
    )]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
