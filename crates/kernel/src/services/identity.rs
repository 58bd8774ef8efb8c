//! Bearer token identity verification.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use uuid::Uuid;

use crate::models::user::hash_token;
use crate::store::UserStore;

/// Lookups are cached this long. A replaced token may keep working for up
/// to this duration unless it is invalidated explicitly.
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(60);

const TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
}

impl CallerIdentity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Resolves a raw bearer token to a caller.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `Ok(None)` means the token is unknown.
    async fn verify(&self, token: &str) -> Result<Option<CallerIdentity>>;
}

/// Verifies tokens against the hashes kept in the user store.
#[derive(Clone)]
pub struct TokenVerifier {
    users: Arc<dyn UserStore>,
    cache: Cache<String, Option<Uuid>>,
}

impl TokenVerifier {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        let cache = Cache::builder()
            .time_to_live(TOKEN_CACHE_TTL)
            .max_capacity(TOKEN_CACHE_CAPACITY)
            .build();
        Self { users, cache }
    }

    /// Drop a cached lookup, e.g. after the token was replaced.
    pub async fn invalidate(&self, token_hash: &str) {
        self.cache.invalidate(token_hash).await;
    }
}

#[async_trait]
impl IdentityVerifier for TokenVerifier {
    async fn verify(&self, token: &str) -> Result<Option<CallerIdentity>> {
        if token.is_empty() {
            return Ok(None);
        }

        let token_hash = hash_token(token);
        if let Some(cached) = self.cache.get(&token_hash).await {
            return Ok(cached.map(CallerIdentity::new));
        }

        // Lookup errors are not cached.
        let user_id = self
            .users
            .find_user_by_token_hash(&token_hash)
            .await?
            .map(|user| user.id);

        self.cache.insert(token_hash, user_id).await;
        Ok(user_id.map(CallerIdentity::new))
    }
}
