//! Persistent storage collaborators.
//!
//! The catalog and account services never talk to a database directly; they
//! go through these traits. [`PgOfferStore`] / [`PgUserStore`] back them with
//! PostgreSQL, [`MemoryStore`] with process memory for tests and local runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgOfferStore, PgUserStore};

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::asset::StoredAsset;
use crate::catalog::{ListingQuery, OfferPredicate};
use crate::models::{Offer, OfferSummary, User};

/// Document store for offers.
///
/// Implementations serialize concurrent writes to the same offer; callers do
/// no locking of their own.
#[async_trait]
pub trait OfferStore: Send + Sync {
    /// One page of summaries matching the query, in the query's order.
    async fn list_offers(&self, query: &ListingQuery) -> Result<Vec<OfferSummary>>;

    /// Number of offers matching the predicate.
    async fn count_offers(&self, predicate: &OfferPredicate) -> Result<u64>;

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>>;

    async fn insert_offer(&self, offer: &Offer) -> Result<()>;

    /// Overwrite a stored offer. Returns `false` if it no longer exists.
    async fn save_offer(&self, offer: &Offer) -> Result<bool>;

    /// Remove an offer, returning it if it existed.
    async fn remove_offer(&self, id: Uuid) -> Result<Option<Offer>>;

    /// Check that the store is reachable.
    async fn is_healthy(&self) -> bool;
}

/// Store for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Replace the stored bearer token hash. Returns `false` if the user is gone.
    async fn update_token_hash(&self, id: Uuid, token_hash: &str) -> Result<bool>;

    /// Set the user's avatar. Returns `false` if the user is gone.
    async fn update_avatar(&self, id: Uuid, avatar: &StoredAsset) -> Result<bool>;
}
