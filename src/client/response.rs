//! Status/body pair returned by every client operation

use crate::models::Pet;
use serde::Serialize;
use serde_json::Value;

/// Raw outcome of one API call.
///
/// Non-2xx statuses are ordinary values here, not errors. A body that does
/// not parse as JSON is kept verbatim as `Value::String`, so an empty body
/// reads as `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Build from a raw response payload
    pub fn from_text(status: u16, text: String) -> Self {
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True if the body is an object carrying `name`
    pub fn has_field(&self, name: &str) -> bool {
        self.body
            .as_object()
            .is_some_and(|obj| obj.contains_key(name))
    }

    /// String value of a top-level field
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }

    /// The `key` field of a key-retrieval response
    pub fn key(&self) -> Option<&str> {
        self.str_field("key")
    }

    /// Entries of the `pets` array, if present
    pub fn pet_values(&self) -> Option<&Vec<Value>> {
        self.body.get("pets").and_then(Value::as_array)
    }

    /// Ids of every listed pet, in service order
    pub fn pet_ids(&self) -> Vec<String> {
        self.pet_values()
            .map(|pets| {
                pets.iter()
                    .filter_map(|p| p.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Typed view of a single-pet body
    pub fn pet(&self) -> Option<Pet> {
        serde_json::from_value(self.body.clone()).ok()
    }

    /// Typed view of a listing body; entries that do not parse are skipped
    pub fn pets(&self) -> Vec<Pet> {
        self.pet_values()
            .map(|pets| {
                pets.iter()
                    .filter_map(|p| serde_json::from_value(p.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
