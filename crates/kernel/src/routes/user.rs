//! Account route handlers.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};

use super::form::MultipartForm;
use crate::error::AppResult;
use crate::services::{AuthenticatedAccount, LoginRequest, SignupRequest};
use crate::state::AppState;

/// Create the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/login", post(login))
}

/// Create an account.
///
/// POST /user/signup
/// Content-Type: multipart/form-data
///
/// Form fields: email, username, phone, password, avatar (optional file)
async fn signup(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<AuthenticatedAccount>> {
    let mut form = MultipartForm::read(multipart).await?;

    let request = SignupRequest {
        email: form.text("email").unwrap_or_default(),
        username: form.text("username").unwrap_or_default(),
        phone: form.text("phone"),
        password: form.raw("password").unwrap_or_default().to_string(),
    };
    let avatar = form.take_file("avatar");

    let account = state.accounts().signup(request, avatar).await?;
    Ok(Json(account))
}

/// Sign in with email and password.
///
/// POST /user/login
/// Content-Type: application/json
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthenticatedAccount>> {
    let account = state.accounts().login(request).await?;
    Ok(Json(account))
}
