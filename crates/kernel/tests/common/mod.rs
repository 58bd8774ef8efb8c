#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wires the real router, services, and bearer middleware to an
//! in-memory store and a recording asset store, so tests need no database or
//! object storage.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use brocante_kernel::models::{Offer, User};
use brocante_kernel::store::{MemoryStore, OfferStore, UserStore};
use brocante_kernel::{AppState, Config, routes};
use brocante_test_utils::{MultipartBody, RecordingAssetStore, TestUser, test_user};

/// Test application wrapper using the real kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub assets: Arc<RecordingAssetStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::in_memory(std::env::temp_dir().join("brocante-tests"));
        let store = Arc::new(MemoryStore::new());
        let assets = Arc::new(RecordingAssetStore::new());

        let state = AppState::from_parts(&config, store.clone(), store.clone(), assets.clone());
        let router = routes::router(state.clone());

        Self {
            router,
            state,
            store,
            assets,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a GET request and decode the JSON response.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        into_json(response).await
    }

    /// Send a multipart request, optionally authenticated.
    pub async fn send_form(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        form: MultipartBody,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, form.content_type());
        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }
        let response = self
            .request(builder.body(Body::from(form.finish())).unwrap())
            .await;
        into_json(response).await
    }

    /// Send a JSON request.
    pub async fn send_json(&self, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        into_json(self.request(request).await).await
    }

    /// Send a DELETE request, optionally authenticated.
    pub async fn delete(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::delete(uri);
        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }
        into_json(self.request(builder.body(Body::empty()).unwrap()).await).await
    }

    /// Insert a user directly into the store.
    pub async fn seed_user(&self, user: &TestUser) -> User {
        let record = user.build();
        self.store.insert_user(&record).await.unwrap();
        record
    }

    /// Insert a fresh user with a unique token and return its builder.
    pub async fn seller(&self, username: &str) -> TestUser {
        let user = test_user(username, &format!("token-{username}"));
        self.seed_user(&user).await;
        user
    }

    /// Insert an offer directly into the store.
    pub async fn seed_offer(&self, offer: Offer) -> Offer {
        self.store.insert_offer(&offer).await.unwrap();
        offer
    }

    /// Load an offer straight from the store.
    pub async fn stored_offer(&self, id: uuid::Uuid) -> Option<Offer> {
        self.store.get_offer(id).await.unwrap()
    }
}

/// Decode a response body as JSON (`Null` for an empty body).
pub async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
