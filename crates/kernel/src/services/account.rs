//! Account service: signup and login.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::identity::TokenVerifier;
use crate::asset::{AssetStore, ImageUpload, StoredAsset};
use crate::catalog::FieldViolation;
use crate::models::User;
use crate::models::user::{generate_token, hash_password, hash_token};
use crate::store::UserStore;

/// Errors returned by account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("this email already has an account")]
    EmailTaken,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no account for this email")]
    UnknownEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid avatar: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation(Vec<FieldViolation>),

    #[error("upstream failure: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

/// Signup form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of an account returned after signup or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    pub username: String,
    pub phone: Option<String>,
    pub avatar: Option<StoredAsset>,
}

/// A signed-in account with its freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedAccount {
    pub id: Uuid,
    pub token: String,
    pub account: AccountProfile,
}

impl AuthenticatedAccount {
    fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            token,
            account: AccountProfile {
                username: user.username.clone(),
                phone: user.phone.clone(),
                avatar: user.avatar.clone(),
            },
        }
    }
}

/// Account service handle.
#[derive(Clone)]
pub struct AccountService {
    inner: Arc<AccountServiceInner>,
}

struct AccountServiceInner {
    users: Arc<dyn UserStore>,
    assets: Arc<dyn AssetStore>,
    verifier: TokenVerifier,
    avatars_folder: String,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        assets: Arc<dyn AssetStore>,
        verifier: TokenVerifier,
        avatars_folder: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AccountServiceInner {
                users,
                assets,
                verifier,
                avatars_folder: avatars_folder.into(),
            }),
        }
    }

    /// Create an account and sign it in.
    pub async fn signup(
        &self,
        request: SignupRequest,
        avatar: Option<ImageUpload>,
    ) -> Result<AuthenticatedAccount, AccountError> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AccountError::MissingField("email"));
        }
        if request.username.trim().is_empty() {
            return Err(AccountError::MissingField("username"));
        }
        if request.password.is_empty() {
            return Err(AccountError::MissingField("password"));
        }
        if let Some(avatar) = &avatar {
            avatar
                .validate("avatar")
                .map_err(|v| AccountError::Validation(vec![v]))?;
        }

        if self.inner.users.find_user_by_email(&email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let token = generate_token();
        let mut user = User {
            id: Uuid::now_v7(),
            email,
            username: request.username.trim().to_string(),
            phone: request.phone.filter(|p| !p.trim().is_empty()),
            avatar: None,
            password_hash: hash_password(&request.password)?,
            token_hash: hash_token(&token),
            created: Utc::now(),
        };
        self.inner.users.insert_user(&user).await?;

        if let Some(avatar) = avatar {
            let folder = format!("{}/{}", self.inner.avatars_folder, user.id);
            let stored = self
                .inner
                .assets
                .upload(&folder, &avatar.filename, &avatar.data)
                .await?;
            if !self.inner.users.update_avatar(user.id, &stored).await? {
                warn!(user_id = %user.id, "user vanished before avatar was recorded");
            }
            user.avatar = Some(stored);
        }

        info!(user_id = %user.id, username = %user.username, "account created");

        Ok(AuthenticatedAccount::new(&user, token))
    }

    /// Check credentials and issue a new token, replacing the previous one.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedAccount, AccountError> {
        let email = request.email.trim().to_lowercase();
        let Some(user) = self.inner.users.find_user_by_email(&email).await? else {
            return Err(AccountError::UnknownEmail);
        };

        if !user.verify_password(&request.password) {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(AccountError::InvalidCredentials);
        }

        let token = generate_token();
        if !self
            .inner
            .users
            .update_token_hash(user.id, &hash_token(&token))
            .await?
        {
            warn!(user_id = %user.id, "user vanished during login");
            return Err(AccountError::UnknownEmail);
        }
        self.inner.verifier.invalidate(&user.token_hash).await;

        info!(user_id = %user.id, "user logged in");

        Ok(AuthenticatedAccount::new(&user, token))
    }
}
