//! PostgreSQL-backed stores.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use super::{OfferStore, UserStore};
use crate::asset::StoredAsset;
use crate::catalog::{ListingQuery, OfferPredicate, query_builder};
use crate::models::{Offer, OfferDetails, OfferSummary, User};

const OFFER_COLUMNS: &str =
    "id, name, description, price, details, image, owner_id, created, changed";

const USER_COLUMNS: &str =
    "id, email, username, phone, avatar, password_hash, token_hash, created";

/// Database row for an offer.
#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    name: String,
    description: String,
    price: f64,
    details: Json<OfferDetails>,
    image: Option<Json<StoredAsset>>,
    owner_id: Uuid,
    created: i64,
    changed: i64,
}

impl From<OfferRow> for Offer {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            details: row.details.0,
            image: row.image.map(|j| j.0),
            owner_id: row.owner_id,
            created: row.created,
            changed: row.changed,
        }
    }
}

/// Database row for a user.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    phone: Option<String>,
    avatar: Option<Json<StoredAsset>>,
    password_hash: String,
    token_hash: String,
    created: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            phone: row.phone,
            avatar: row.avatar.map(|j| j.0),
            password_hash: row.password_hash,
            token_hash: row.token_hash,
            created: row.created,
        }
    }
}

/// Offer store over the `offers` table.
#[derive(Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn list_offers(&self, query: &ListingQuery) -> Result<Vec<OfferSummary>> {
        let sql = query_builder::build_select(query);
        debug!(sql = %sql, "listing offers");

        let offers = sqlx::query_as::<_, OfferSummary>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list offers")?;

        Ok(offers)
    }

    async fn count_offers(&self, predicate: &OfferPredicate) -> Result<u64> {
        let sql = query_builder::build_count(predicate);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .context("failed to count offers")?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch offer by id")?;

        Ok(row.map(Offer::from))
    }

    async fn insert_offer(&self, offer: &Offer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO offers (id, name, description, price, details, image, owner_id, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(&offer.description)
        .bind(offer.price)
        .bind(Json(&offer.details))
        .bind(offer.image.as_ref().map(Json))
        .bind(offer.owner_id)
        .bind(offer.created)
        .bind(offer.changed)
        .execute(&self.pool)
        .await
        .context("failed to insert offer")?;

        Ok(())
    }

    async fn save_offer(&self, offer: &Offer) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE offers SET
                name = $1,
                description = $2,
                price = $3,
                details = $4,
                image = $5,
                changed = $6
            WHERE id = $7
            "#,
        )
        .bind(&offer.name)
        .bind(&offer.description)
        .bind(offer.price)
        .bind(Json(&offer.details))
        .bind(offer.image.as_ref().map(Json))
        .bind(offer.changed)
        .bind(offer.id)
        .execute(&self.pool)
        .await
        .context("failed to update offer")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "DELETE FROM offers WHERE id = $1 RETURNING {OFFER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to delete offer")?;

        Ok(row.map(Offer::from))
    }

    async fn is_healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}

/// User store over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {filter} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to fetch user by {filter}"))?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch user by id")?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        self.find_one("token_hash", token_hash).await
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, phone, avatar, password_hash, token_hash, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.phone)
        .bind(user.avatar.as_ref().map(Json))
        .bind(&user.password_hash)
        .bind(&user.token_hash)
        .bind(user.created)
        .execute(&self.pool)
        .await
        .context("failed to create user")?;

        Ok(())
    }

    async fn update_token_hash(&self, id: Uuid, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET token_hash = $1 WHERE id = $2")
            .bind(token_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to update token hash")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_avatar(&self, id: Uuid, avatar: &StoredAsset) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
            .bind(Json(avatar))
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to update avatar")?;

        Ok(result.rows_affected() > 0)
    }
}
