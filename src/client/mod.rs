//! PetFriends REST client
//!
//! Thin async wrapper over the PetFriends HTTP API. Every operation returns
//! an [`ApiResponse`] carrying the HTTP status and the parsed body; a 403 or
//! 400 from the service is a normal return value. Only local failures
//! (transport errors, unreadable photo files, bad configuration) surface as
//! [`ClientError`].
//!
//! # Example
//!
//! ```no_run
//! use petfriends_api::client::PetFriendsClient;
//! use petfriends_api::models::{AuthKey, PetFilter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PetFriendsClient::new("https://petfriends.skillfactory.ru/")?;
//!
//! let response = client.get_api_key("owner@example.com", "secret").await?;
//! let key = AuthKey::from_response(&response).ok_or("no key in response")?;
//!
//! let mine = client.get_list_of_pets(&key, PetFilter::MyPets).await?;
//! println!("{} pets", mine.pet_ids().len());
//! # Ok(())
//! # }
//! ```

use crate::config::{is_valid_http_url, ServiceConfig};
use crate::models::{AuthKey, PetFilter};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Url};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod photo;
mod response;

pub use photo::PetPhoto;
pub use response::ApiResponse;

/// Header carrying the auth key on every authenticated call
pub const AUTH_KEY_HEADER: &str = "auth_key";

/// Characters left untouched when a pet id is placed in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read photo {path:?}: {source}")]
    Photo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build client: {0}")]
    Build(String),
}

/// PetFriends API client
#[derive(Debug, Clone)]
pub struct PetFriendsClient {
    base_url: Url,
    client: reqwest::Client,
}

/// Builder for PetFriendsClient
#[derive(Default)]
pub struct PetFriendsClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl PetFriendsClientBuilder {
    /// Set the service base URL
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Set a request timeout (default: none)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the User-Agent header
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Build the PetFriendsClient
    pub fn build(self) -> Result<PetFriendsClient, ClientError> {
        let raw = self
            .base_url
            .ok_or_else(|| ClientError::InvalidUrl("base URL is required".into()))?;
        let base_url = normalize_base_url(&raw)?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("petfriends-api/{}", crate::VERSION));

        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(PetFriendsClient { base_url, client })
    }
}

/// Parse, check the scheme and force a trailing slash so joins stay under it
fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    if !is_valid_http_url(trimmed) {
        return Err(ClientError::InvalidUrl(format!(
            "'{}' must start with http:// or https://",
            trimmed
        )));
    }

    let with_slash = format!("{}/", trimmed.trim_end_matches('/'));
    Url::parse(&with_slash).map_err(|e| ClientError::InvalidUrl(format!("'{}': {}", trimmed, e)))
}

impl PetFriendsClient {
    /// Create a client with transport defaults
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new builder for PetFriendsClient
    pub fn builder() -> PetFriendsClientBuilder {
        PetFriendsClientBuilder::default()
    }

    /// Create a client from the `service` section of the configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ClientError> {
        let mut builder = Self::builder().base_url(&config.base_url);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Normalized base URL (always ends with `/`)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// `pet_id` always lands in exactly one path segment. Empty and dot ids
    /// cannot (URL parsing collapses `.`, `..` and their `%2E` forms).
    fn pet_endpoint(&self, prefix: &str, pet_id: &str) -> Result<Url, ClientError> {
        if matches!(pet_id, "" | "." | "..") {
            return Err(ClientError::InvalidUrl(format!(
                "pet id '{}' is not a usable path segment",
                pet_id
            )));
        }
        let segment = utf8_percent_encode(pet_id, PATH_SEGMENT);
        self.endpoint(&format!("{}{}", prefix, segment))
    }

    /// Issue the request and capture status and body
    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, ClientError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let response = ApiResponse::from_text(status, text);
        debug!(status, success = response.is_success(), "PetFriends response");
        Ok(response)
    }

    /// `GET /api/key`: exchange credentials for an auth key.
    ///
    /// Success bodies carry `key`; rejected credentials come back as 403.
    #[tracing::instrument(name = "petfriends.get_api_key", skip_all)]
    pub async fn get_api_key(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .client
            .get(self.endpoint("api/key")?)
            .header("email", email)
            .header("password", password);
        self.send(request).await
    }

    /// `GET /api/pets?filter=...`: list all pets or only the caller's
    #[tracing::instrument(name = "petfriends.get_list_of_pets", skip_all, fields(filter = %filter))]
    pub async fn get_list_of_pets(
        &self,
        auth_key: &AuthKey,
        filter: PetFilter,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .client
            .get(self.endpoint("api/pets")?)
            .header(AUTH_KEY_HEADER, auth_key.as_str())
            .query(&[("filter", filter.as_query_value())]);
        self.send(request).await
    }

    /// `POST /api/pets`: create a pet with a photo (multipart)
    #[tracing::instrument(
        name = "petfriends.add_new_pet",
        skip_all,
        fields(photo = %photo_path.as_ref().display())
    )]
    pub async fn add_new_pet(
        &self,
        auth_key: &AuthKey,
        name: &str,
        animal_type: &str,
        age: impl Display,
        photo_path: impl AsRef<Path>,
    ) -> Result<ApiResponse, ClientError> {
        let photo = PetPhoto::load(photo_path.as_ref())?;
        debug!(bytes = photo.len(), mime = photo.mime(), "Attaching pet photo");

        let form = Form::new()
            .text("name", name.to_string())
            .text("animal_type", animal_type.to_string())
            .text("age", age.to_string())
            .part("pet_photo", photo.into_part()?);

        let request = self
            .client
            .post(self.endpoint("api/pets")?)
            .header(AUTH_KEY_HEADER, auth_key.as_str())
            .multipart(form);
        self.send(request).await
    }

    /// `POST /api/create_pet_simple`: create a pet without a photo
    #[tracing::instrument(name = "petfriends.add_new_pet_without_photo", skip_all)]
    pub async fn add_new_pet_without_photo(
        &self,
        auth_key: &AuthKey,
        name: &str,
        animal_type: &str,
        age: impl Display,
    ) -> Result<ApiResponse, ClientError> {
        let age = age.to_string();
        let request = self
            .client
            .post(self.endpoint("api/create_pet_simple")?)
            .header(AUTH_KEY_HEADER, auth_key.as_str())
            .form(&[("name", name), ("animal_type", animal_type), ("age", age.as_str())]);
        self.send(request).await
    }

    /// `PUT /api/pets/{pet_id}`: replace name, type and age
    #[tracing::instrument(
        name = "petfriends.update_pet_info",
        skip_all,
        fields(pet_id = %pet_id)
    )]
    pub async fn update_pet_info(
        &self,
        auth_key: &AuthKey,
        pet_id: &str,
        name: &str,
        animal_type: &str,
        age: impl Display,
    ) -> Result<ApiResponse, ClientError> {
        let age = age.to_string();
        let request = self
            .client
            .put(self.pet_endpoint("api/pets/", pet_id)?)
            .header(AUTH_KEY_HEADER, auth_key.as_str())
            .form(&[("name", name), ("animal_type", animal_type), ("age", age.as_str())]);
        self.send(request).await
    }

    /// `DELETE /api/pets/{pet_id}`
    #[tracing::instrument(name = "petfriends.delete_pet", skip_all, fields(pet_id = %pet_id))]
    pub async fn delete_pet(
        &self,
        auth_key: &AuthKey,
        pet_id: &str,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .client
            .delete(self.pet_endpoint("api/pets/", pet_id)?)
            .header(AUTH_KEY_HEADER, auth_key.as_str());
        self.send(request).await
    }

    /// `POST /api/pets/set_photo/{pet_id}`: attach or replace a photo
    #[tracing::instrument(
        name = "petfriends.add_photo_of_pet",
        skip_all,
        fields(pet_id = %pet_id, photo = %photo_path.as_ref().display())
    )]
    pub async fn add_photo_of_pet(
        &self,
        auth_key: &AuthKey,
        pet_id: &str,
        photo_path: impl AsRef<Path>,
    ) -> Result<ApiResponse, ClientError> {
        let photo = PetPhoto::load(photo_path.as_ref())?;
        let form = Form::new().part("pet_photo", photo.into_part()?);

        let request = self
            .client
            .post(self.pet_endpoint("api/pets/set_photo/", pet_id)?)
            .header(AUTH_KEY_HEADER, auth_key.as_str())
            .multipart(form);
        self.send(request).await
    }
}
