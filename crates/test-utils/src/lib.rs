//! Brocante test utilities.
//!
//! Helpers for integration testing: offer and user fixtures, an in-memory
//! asset store that records what it was asked to do, multipart body
//! building, and JSON assertion helpers.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use brocante_kernel::asset::{AssetStore, StoredAsset};
use brocante_kernel::models::user::{hash_password, hash_token};
use brocante_kernel::models::{DetailKey, Offer, OfferDetails, User};

/// Smallest byte sequence recognized as a PNG image.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// Create a test offer with default values.
///
/// Details carry every key with an empty value, like a freshly published
/// offer without details.
pub fn test_offer(name: &str, price: f64) -> TestOffer {
    TestOffer {
        id: Uuid::now_v7(),
        name: name.to_string(),
        description: String::new(),
        price,
        details: DetailKey::ALL.iter().map(|k| (*k, String::new())).collect(),
        owner_id: Uuid::nil(),
    }
}

/// A test offer builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestOffer {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub details: Vec<(DetailKey, String)>,
    pub owner_id: Uuid,
}

impl TestOffer {
    /// Set the owner.
    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = owner_id;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Replace the detail entries, in order.
    pub fn with_details(mut self, details: &[(DetailKey, &str)]) -> Self {
        self.details = details
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect();
        self
    }

    /// Build the offer record.
    ///
    /// # Panics
    ///
    /// Panics if the same detail key was given twice.
    #[allow(clippy::expect_used)]
    pub fn build(self) -> Offer {
        let now = Utc::now().timestamp();
        Offer {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            details: OfferDetails::from_entries(self.details).expect("duplicate detail key"),
            image: None,
            owner_id: self.owner_id,
            created: now,
            changed: now,
        }
    }
}

/// Create a test user with the given username and bearer token.
///
/// The email is derived from the username.
pub fn test_user(username: &str, token: &str) -> TestUser {
    TestUser {
        id: Uuid::now_v7(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        phone: None,
        password: "password".to_string(),
        token: token.to_string(),
    }
}

/// A test user builder.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub password: String,
    pub token: String,
}

impl TestUser {
    /// Set the phone number.
    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// `Authorization` header value for this user.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Build the user record with hashed credentials.
    ///
    /// # Panics
    ///
    /// Panics if password hashing fails.
    #[allow(clippy::expect_used)]
    pub fn build(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            phone: self.phone.clone(),
            avatar: None,
            password_hash: hash_password(&self.password).expect("hash password"),
            token_hash: hash_token(&self.token),
            created: Utc::now(),
        }
    }
}

/// Asset store that keeps nothing and records every call.
#[derive(Debug, Default)]
pub struct RecordingAssetStore {
    uploads: Mutex<Vec<StoredAsset>>,
    deleted_folders: Mutex<Vec<String>>,
}

impl RecordingAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assets uploaded so far, in order.
    pub fn uploads(&self) -> Vec<StoredAsset> {
        self.uploads.lock().clone()
    }

    /// Folders released so far, in order.
    pub fn deleted_folders(&self) -> Vec<String> {
        self.deleted_folders.lock().clone()
    }
}

#[async_trait]
impl AssetStore for RecordingAssetStore {
    async fn upload(&self, folder: &str, filename: &str, _data: &[u8]) -> Result<StoredAsset> {
        let id = format!("{}/{filename}", folder.trim_matches('/'));
        let asset = StoredAsset {
            url: format!("https://assets.test/{id}"),
            id,
        };
        self.uploads.lock().push(asset.clone());
        Ok(asset)
    }

    async fn delete_folder(&self, folder: &str) -> Result<()> {
        self.deleted_folders.lock().push(folder.to_string());
        Ok(())
    }

    fn scheme(&self) -> &'static str {
        "recording"
    }
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("brocante-{}", Uuid::now_v7().simple()),
            body: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Finish the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value does not have a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to NOT have key '{key}', got: {value}"
        );
    }

    /// Assert that a validation error body names exactly these fields.
    pub fn violation_fields(value: &Value, expected: &[&str]) {
        let fields: Vec<&str> = value["violations"]
            .as_array()
            .map(|v| v.iter().filter_map(|e| e["field"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(fields, expected, "unexpected violations in {value}");
    }
}
