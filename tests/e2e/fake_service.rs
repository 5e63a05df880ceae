//! In-process PetFriends fake
//!
//! A stateful `wiremock` responder reproducing the PetFriends endpoints:
//! key issuance, per-key ownership, list filtering, create/update/delete and
//! photo upload. It validates input the way a well-behaved service should,
//! so the defect-probing scenarios pass against it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use petfriends_api::client::AUTH_KEY_HEADER;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use wiremock::{Request, Respond, ResponseTemplate};

/// Characters the fake refuses in `animal_type`
pub const FORBIDDEN_SYMBOLS: &str = "#$%^&*{}|?/><=+_~@";

/// Longest accepted `animal_type`, in words
pub const MAX_ANIMAL_TYPE_WORDS: usize = 10;

/// Account that owns the seeded pets
const SEED_EMAIL: &str = "shelter@petfriends.test";

struct Account {
    password: String,
    user_id: String,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, Account>,
    keys: HashMap<String, String>,
    pets: Vec<Map<String, Value>>,
    sequence: u64,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Stateful PetFriends responder
#[derive(Clone)]
pub struct FakePetFriends {
    state: Arc<Mutex<FakeState>>,
}

/// One part of a multipart body
struct FormPart {
    data: Vec<u8>,
    content_type: Option<String>,
}

impl FakePetFriends {
    /// Fake with one registered account and a couple of pets owned by
    /// somebody else, so the unfiltered listing is never empty.
    pub fn new(email: &str, password: &str) -> Self {
        let fake = Self {
            state: Arc::new(Mutex::new(FakeState::default())),
        };
        fake.register(email, password);
        fake.register(SEED_EMAIL, "shelter-password");

        let seed_owner = fake.user_id_of(SEED_EMAIL).unwrap_or_default();
        for (name, animal_type, age) in [("Бобик", "пёс", "7"), ("Кеша", "попугай", "2")] {
            fake.insert_pet(&seed_owner, name, animal_type, age, String::new());
        }
        fake
    }

    pub fn register(&self, email: &str, password: &str) {
        let mut state = self.state.lock().unwrap();
        let user_id = format!("user-{:04}", state.next_id());
        state.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id,
            },
        );
    }

    fn user_id_of(&self, email: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.accounts.get(email).map(|a| a.user_id.clone())
    }

    fn insert_pet(
        &self,
        owner: &str,
        name: &str,
        animal_type: &str,
        age: &str,
        pet_photo: String,
    ) -> Value {
        let mut state = self.state.lock().unwrap();
        let n = state.next_id();
        let mut pet = Map::new();
        pet.insert("id".into(), json!(format!("{:032x}", 0xfeed_0000_u64 + n)));
        pet.insert("name".into(), json!(name));
        pet.insert("animal_type".into(), json!(animal_type));
        pet.insert("age".into(), json!(age));
        pet.insert("pet_photo".into(), json!(pet_photo));
        pet.insert("created_at".into(), json!(format!("{}", 1_700_000_000 + n)));
        pet.insert("user_id".into(), json!(owner));
        state.pets.push(pet.clone());
        Value::Object(pet)
    }

    /// Number of pets owned by `email`
    pub fn pet_count_of(&self, email: &str) -> usize {
        let Some(owner) = self.user_id_of(email) else {
            return 0;
        };
        let state = self.state.lock().unwrap();
        state
            .pets
            .iter()
            .filter(|p| p.get("user_id").and_then(Value::as_str) == Some(owner.as_str()))
            .count()
    }

    /// True if any pet (of any owner) has this id
    pub fn contains_pet(&self, pet_id: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .pets
            .iter()
            .any(|p| p.get("id").and_then(Value::as_str) == Some(pet_id))
    }

    fn caller(&self, request: &Request) -> Option<String> {
        let key = header(request, AUTH_KEY_HEADER)?;
        let state = self.state.lock().unwrap();
        state.keys.get(&key).cloned()
    }

    fn issue_key(&self, request: &Request) -> ResponseTemplate {
        let (Some(email), Some(password)) = (header(request, "email"), header(request, "password"))
        else {
            return forbidden();
        };

        let mut state = self.state.lock().unwrap();
        let user_id = match state.accounts.get(&email) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => return forbidden(),
        };
        let key = format!("{:056x}", 0xa11ce_u64 + state.next_id());
        state.keys.insert(key.clone(), user_id);
        ResponseTemplate::new(200).set_body_json(json!({ "key": key }))
    }

    fn list(&self, request: &Request, caller: &str) -> ResponseTemplate {
        let filter = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "filter")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        let state = self.state.lock().unwrap();
        let pets: Vec<Value> = match filter.as_str() {
            "" => state.pets.iter().cloned().map(Value::Object).collect(),
            "my_pets" => state
                .pets
                .iter()
                .filter(|p| p.get("user_id").and_then(Value::as_str) == Some(caller))
                .cloned()
                .map(Value::Object)
                .collect(),
            _ => return bad_request("Filter value is incorrect"),
        };
        ResponseTemplate::new(200).set_body_json(json!({ "pets": pets }))
    }

    fn create(&self, caller: &str, fields: &HashMap<String, String>, photo: String) -> ResponseTemplate {
        let (name, animal_type, age) = match required_pet_fields(fields) {
            Ok(values) => values,
            Err(message) => return bad_request(&message),
        };
        let pet = self.insert_pet(caller, name, animal_type, age, photo);
        ResponseTemplate::new(200).set_body_json(pet)
    }

    fn with_own_pet<F>(&self, caller: &str, pet_id: &str, f: F) -> ResponseTemplate
    where
        F: FnOnce(&mut Vec<Map<String, Value>>, usize) -> ResponseTemplate,
    {
        let mut state = self.state.lock().unwrap();
        let position = state.pets.iter().position(|p| {
            p.get("id").and_then(Value::as_str) == Some(pet_id)
                && p.get("user_id").and_then(Value::as_str) == Some(caller)
        });
        match position {
            Some(index) => f(&mut state.pets, index),
            None => bad_request("Pet not found or does not belong to you"),
        }
    }

    fn update(&self, caller: &str, pet_id: &str, fields: &HashMap<String, String>) -> ResponseTemplate {
        let (name, animal_type, age) = match required_pet_fields(fields) {
            Ok(values) => values,
            Err(message) => return bad_request(&message),
        };
        self.with_own_pet(caller, pet_id, |pets, index| {
            let pet = &mut pets[index];
            pet.insert("name".into(), json!(name));
            pet.insert("animal_type".into(), json!(animal_type));
            pet.insert("age".into(), json!(age));
            ResponseTemplate::new(200).set_body_json(Value::Object(pet.clone()))
        })
    }

    fn delete(&self, caller: &str, pet_id: &str) -> ResponseTemplate {
        self.with_own_pet(caller, pet_id, |pets, index| {
            pets.remove(index);
            ResponseTemplate::new(200)
        })
    }

    fn set_photo(&self, caller: &str, pet_id: &str, photo: Option<String>) -> ResponseTemplate {
        let Some(photo) = photo else {
            return bad_request("pet_photo is required");
        };
        self.with_own_pet(caller, pet_id, |pets, index| {
            let pet = &mut pets[index];
            pet.insert("pet_photo".into(), json!(photo));
            ResponseTemplate::new(200).set_body_json(Value::Object(pet.clone()))
        })
    }
}

impl Respond for FakePetFriends {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let method = request.method.as_str().to_ascii_uppercase();
        let path = request.url.path().trim_end_matches('/').to_string();

        if method == "GET" && path == "/api/key" {
            return self.issue_key(request);
        }

        let Some(caller) = self.caller(request) else {
            return forbidden();
        };

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match (method.as_str(), segments.as_slice()) {
            ("GET", ["api", "pets"]) => self.list(request, &caller),
            ("POST", ["api", "pets"]) => {
                let Some(parts) = multipart_parts(request) else {
                    return bad_request("Expected multipart/form-data");
                };
                let fields = text_fields(&parts);
                let photo = parts.get("pet_photo").map(photo_data_uri).unwrap_or_default();
                self.create(&caller, &fields, photo)
            }
            ("POST", ["api", "create_pet_simple"]) => {
                self.create(&caller, &urlencoded_fields(request), String::new())
            }
            ("PUT", ["api", "pets", pet_id]) => {
                self.update(&caller, pet_id, &urlencoded_fields(request))
            }
            ("DELETE", ["api", "pets", pet_id]) => self.delete(&caller, pet_id),
            ("POST", ["api", "pets", "set_photo", pet_id]) => {
                let photo = multipart_parts(request)
                    .and_then(|parts| parts.get("pet_photo").map(photo_data_uri));
                self.set_photo(&caller, pet_id, photo)
            }
            _ => ResponseTemplate::new(404).set_body_string("<h1>Not Found</h1>"),
        }
    }
}

fn forbidden() -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_string(
        "<h1>Forbidden</h1><p>This user wasn't found in database</p>",
    )
}

fn bad_request(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_string(format!("<h1>Bad Request</h1><p>{}</p>", message))
}

fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Name, type and age after validation
fn required_pet_fields(
    fields: &HashMap<String, String>,
) -> Result<(&str, &str, &str), String> {
    let get = |key: &str| {
        fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| format!("{} is required", key))
    };
    let (name, animal_type, age) = (get("name")?, get("animal_type")?, get("age")?);

    if name.trim().is_empty() {
        return Err("name cannot be blank".into());
    }
    if animal_type.trim().is_empty() {
        return Err("animal_type cannot be blank".into());
    }
    if animal_type.split_whitespace().count() > MAX_ANIMAL_TYPE_WORDS {
        return Err("animal_type is too long".into());
    }
    if animal_type.chars().any(|c| FORBIDDEN_SYMBOLS.contains(c)) {
        return Err("animal_type contains forbidden symbols".into());
    }
    if animal_type.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return Err("animal_type must contain letters".into());
    }
    if age.trim().parse::<u32>().is_err() {
        return Err("age must be a non-negative whole number".into());
    }
    Ok((name, animal_type, age))
}

fn photo_data_uri(part: &FormPart) -> String {
    let mime = part.content_type.as_deref().unwrap_or("image/jpeg");
    format!("data:{};base64,{}", mime, STANDARD.encode(&part.data))
}

fn text_fields(parts: &HashMap<String, FormPart>) -> HashMap<String, String> {
    parts
        .iter()
        .filter(|(_, part)| part.content_type.is_none())
        .map(|(name, part)| (name.clone(), String::from_utf8_lossy(&part.data).into_owned()))
        .collect()
}

fn urlencoded_fields(request: &Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&request.body).unwrap_or_default()
}

/// Parse a multipart/form-data body into named parts
fn multipart_parts(request: &Request) -> Option<HashMap<String, FormPart>> {
    parse_multipart(&header(request, "content-type")?, request.body.clone())
}

fn parse_multipart(content_type: &str, body: Vec<u8>) -> Option<HashMap<String, FormPart>> {
    let boundary = multer::parse_boundary(content_type).ok()?;
    let stream = futures::stream::once(futures::future::ready(Ok::<_, Infallible>(body)));
    let mut multipart = multer::Multipart::new(stream, boundary);

    // The whole body is already in memory, so nothing here ever waits
    futures::executor::block_on(async move {
        let mut parts = HashMap::new();
        while let Some(field) = multipart.next_field().await.ok()? {
            let name = field.name()?.to_string();
            let content_type = field.content_type().map(|mime| mime.to_string());
            let data = field.bytes().await.ok()?.to_vec();
            parts.insert(name, FormPart { data, content_type });
        }
        Some(parts)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rules() {
        let fields = |name: &str, animal_type: &str, age: &str| {
            HashMap::from([
                ("name".to_string(), name.to_string()),
                ("animal_type".to_string(), animal_type.to_string()),
                ("age".to_string(), age.to_string()),
            ])
        };

        assert!(required_pet_fields(&fields("Барсик", "просто кот", "4")).is_ok());
        assert!(required_pet_fields(&fields(" ", "кот", "4")).is_err());
        assert!(required_pet_fields(&fields("Барсик", "Cat%@", "4")).is_err());
        assert!(required_pet_fields(&fields("Барсик", "36415", "4")).is_err());
        assert!(required_pet_fields(&fields("Барсик", "кот", "-4")).is_err());
        assert!(required_pet_fields(&fields("Барсик", "a b c d e f g h i j k", "4")).is_err());
    }

    #[test]
    fn test_parse_multipart_separates_text_and_file_parts() {
        let body = concat!(
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"name\"\r\n\r\n",
            "Барсик\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"pet_photo\"; filename=\"cat.png\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "\u{89}PNG\r\n",
            "--XyZ--\r\n",
        );

        let parts = parse_multipart("multipart/form-data; boundary=XyZ", body.into()).unwrap();
        assert_eq!(text_fields(&parts).get("name").map(String::as_str), Some("Барсик"));

        let photo = &parts["pet_photo"];
        assert_eq!(photo.content_type.as_deref(), Some("image/png"));
        assert!(photo_data_uri(photo).starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_parse_multipart_needs_a_boundary() {
        assert!(parse_multipart("application/x-www-form-urlencoded", Vec::new()).is_none());
    }
}
