//! HTTP route handlers.

pub mod form;
pub mod health;
pub mod offer;
pub mod user;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::asset::MAX_IMAGE_SIZE;
use crate::state::AppState;

/// Request bodies may carry one full-size image plus form fields.
const MAX_BODY_SIZE: usize = MAX_IMAGE_SIZE + 1024 * 1024;

/// Build the application router with bearer authentication applied.
///
/// Outer layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .merge(health::router())
        .merge(offer::router())
        .merge(user::router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::authenticate_bearer_token,
        ))
        .with_state(state)
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Brocante API" }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Page not found" })))
}
