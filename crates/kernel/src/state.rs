//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::asset::{AssetStore, LocalAssetStore};
use crate::catalog::OfferService;
use crate::config::Config;
use crate::db;
use crate::services::{AccountService, IdentityVerifier, TokenVerifier};
use crate::store::{MemoryStore, OfferStore, PgOfferStore, PgUserStore, UserStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Offer catalog operations.
    offers: OfferService,

    /// Signup and login.
    accounts: AccountService,

    /// Bearer token verification.
    identity: Arc<dyn IdentityVerifier>,

    /// Offer store, for health checks.
    offer_store: Arc<dyn OfferStore>,
}

impl AppState {
    /// Create application state from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let (offer_store, user_store): (Arc<dyn OfferStore>, Arc<dyn UserStore>) =
            if config.uses_memory_store() {
                info!("using in-memory store");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            } else {
                let pool = db::create_pool(config)
                    .await
                    .context("failed to create database pool")?;
                db::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                (
                    Arc::new(PgOfferStore::new(pool.clone())),
                    Arc::new(PgUserStore::new(pool)),
                )
            };

        let assets = create_asset_store(config).await?;
        info!(scheme = assets.scheme(), "asset store ready");

        Ok(Self::from_parts(config, offer_store, user_store, assets))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        config: &Config,
        offer_store: Arc<dyn OfferStore>,
        user_store: Arc<dyn UserStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        let verifier = TokenVerifier::new(user_store.clone());

        let offers = OfferService::new(
            offer_store.clone(),
            user_store.clone(),
            assets.clone(),
            config.offers_folder.clone(),
        );
        let accounts = AccountService::new(
            user_store,
            assets,
            verifier.clone(),
            config.avatars_folder.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                offers,
                accounts,
                identity: Arc::new(verifier),
                offer_store,
            }),
        }
    }

    /// Get the offer service.
    pub fn offers(&self) -> &OfferService {
        &self.inner.offers
    }

    /// Get the account service.
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    /// Get the bearer token verifier.
    pub fn identity(&self) -> &Arc<dyn IdentityVerifier> {
        &self.inner.identity
    }

    /// Check if storage is healthy.
    pub async fn storage_healthy(&self) -> bool {
        self.inner.offer_store.is_healthy().await
    }
}

#[cfg(feature = "s3")]
async fn create_asset_store(config: &Config) -> Result<Arc<dyn AssetStore>> {
    use crate::asset::S3AssetStore;

    let Some(bucket) = &config.s3_bucket else {
        return Ok(local_asset_store(config));
    };
    let base_url = config
        .s3_public_url
        .clone()
        .unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"));

    let store = match &config.s3_endpoint {
        Some(endpoint) => {
            S3AssetStore::with_endpoint(endpoint, bucket, config.s3_prefix.clone(), base_url)
                .await
        }
        None => S3AssetStore::new(bucket, config.s3_prefix.clone(), base_url).await,
    }
    .context("failed to create S3 asset store")?;

    Ok(Arc::new(store))
}

#[cfg(not(feature = "s3"))]
async fn create_asset_store(config: &Config) -> Result<Arc<dyn AssetStore>> {
    if config.s3_bucket.is_some() {
        tracing::warn!("S3_BUCKET is set but the s3 feature is disabled; using local storage");
    }
    Ok(local_asset_store(config))
}

fn local_asset_store(config: &Config) -> Arc<dyn AssetStore> {
    Arc::new(LocalAssetStore::new(
        &config.uploads_dir,
        &config.files_url,
    ))
}
