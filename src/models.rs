//! Domain types for the PetFriends API
//!
//! Everything here is a thin, transient view over data owned by the remote
//! service. The client itself works with raw JSON; these types exist for
//! callers that want typed access.

use crate::client::ApiResponse;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Email/password pair used to obtain an auth key
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Opaque token returned by `GET /api/key`.
///
/// Sent as the `auth_key` header on every subsequent call.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthKey(String);

impl AuthKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Extract the key from a key-retrieval response.
    ///
    /// Returns `None` when the body carries no string `key` field, which is
    /// what the service answers on rejected credentials.
    pub fn from_response(response: &ApiResponse) -> Option<Self> {
        response.key().map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(***)")
    }
}

/// Listing filter for `GET /api/pets`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PetFilter {
    /// Every pet on the site
    #[default]
    All,
    /// Pets owned by the caller
    MyPets,
}

impl PetFilter {
    /// Value of the `filter` query parameter
    pub fn as_query_value(&self) -> &'static str {
        match self {
            PetFilter::All => "",
            PetFilter::MyPets => "my_pets",
        }
    }
}

impl fmt::Display for PetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PetFilter::All => f.write_str("all"),
            PetFilter::MyPets => f.write_str("my_pets"),
        }
    }
}

impl FromStr for PetFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(PetFilter::All),
            "my_pets" | "my-pets" | "mine" => Ok(PetFilter::MyPets),
            other => Err(format!(
                "unknown filter '{}': expected 'all' or 'my_pets'",
                other
            )),
        }
    }
}

/// Pet record as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    #[serde(deserialize_with = "deserialize_age")]
    pub age: String,
    #[serde(default)]
    pub pet_photo: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Pet {
    /// True when the service stored a non-empty photo
    pub fn has_photo(&self) -> bool {
        self.pet_photo.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Ages are strings on the wire, but accept bare numbers too.
fn deserialize_age<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Age {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Age::deserialize(deserializer)? {
        Age::Text(s) => s,
        Age::Int(n) => n.to_string(),
        Age::Float(n) => n.to_string(),
    })
}
