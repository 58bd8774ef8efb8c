//! Bearer token authentication middleware.
//!
//! Checks `Authorization: Bearer <token>` headers, resolves the token
//! through the identity verifier, and sets the caller identity.

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::services::CallerIdentity;
use crate::state::AppState;

/// Middleware to authenticate bearer tokens.
///
/// - Valid token: inserts [`CallerIdentity`] into request extensions
/// - Unknown token: returns 401 JSON error
/// - No header: passes through; protected handlers reject the request
pub async fn authenticate_bearer_token(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(token) = auth_header.and_then(|v| v.strip_prefix("Bearer ")) else {
        return next.run(request).await;
    };

    let caller = match state.identity().verify(token.trim()).await {
        Ok(Some(caller)) => caller,
        Ok(None) => {
            debug!("unknown bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                [("WWW-Authenticate", "Bearer error=\"invalid_token\"")],
                Json(json!({"error": "Invalid token"})),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to verify bearer token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(caller);

    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}
