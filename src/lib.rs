//! PetFriends API Library
//!
//! Async client and end-to-end test support for the PetFriends pet-adoption
//! REST API.
//!
//! # Features
//!
//! - **Status-first responses**: every call yields `(status, body)`; HTTP
//!   errors are values, not failures
//! - **Full API surface**: key retrieval, listing, create (with or without
//!   photo), update, delete, photo upload
//! - **Config from YAML or env**: `${VAR}` expansion and validation
//! - **Structured logging** via `tracing`
//!
//! # Example
//!
//! ```no_run
//! use petfriends_api::{client::PetFriendsClient, config::Config, models::AuthKey};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("petfriends.yaml")?;
//!     let client = PetFriendsClient::from_config(&config.service)?;
//!
//!     let creds = config.credentials.valid();
//!     let response = client.get_api_key(&creds.email, &creds.password).await?;
//!     let key = AuthKey::from_response(&response);
//!     println!("status={} key_present={}", response.status, key.is_some());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use client::{ApiResponse, ClientError, PetFriendsClient};
pub use config::Config;
pub use models::{AuthKey, Credentials, Pet, PetFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
