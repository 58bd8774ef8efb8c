//! Offer service.
//!
//! Orchestrates listing, detail, publish, update, and delete over the offer
//! store, the user store, and the asset store.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::merge::{apply_update, validate_description, validate_name, validate_price_input};
use super::{FieldViolation, OfferError, OfferFilter};
use crate::asset::{AssetStore, ImageUpload};
use crate::models::{NewOffer, Offer, OfferChanges, OfferDetail, OfferSummary};
use crate::services::CallerIdentity;
use crate::store::{OfferStore, UserStore};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferPage {
    /// Offers matching the filter, across all pages.
    pub count: u64,
    pub offers: Vec<OfferSummary>,
}

/// Service for catalog operations.
#[derive(Clone)]
pub struct OfferService {
    inner: Arc<OfferServiceInner>,
}

struct OfferServiceInner {
    offers: Arc<dyn OfferStore>,
    users: Arc<dyn UserStore>,
    assets: Arc<dyn AssetStore>,
    offers_folder: String,
}

impl OfferService {
    pub fn new(
        offers: Arc<dyn OfferStore>,
        users: Arc<dyn UserStore>,
        assets: Arc<dyn AssetStore>,
        offers_folder: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(OfferServiceInner {
                offers,
                users,
                assets,
                offers_folder: offers_folder.into(),
            }),
        }
    }

    /// Asset folder holding an offer's pictures.
    fn folder(&self, id: Uuid) -> String {
        format!("{}/{}", self.inner.offers_folder.trim_end_matches('/'), id)
    }

    /// Best-effort release of an offer folder whose record was never stored.
    async fn release_folder(&self, id: Uuid) {
        if let Err(e) = self.inner.assets.delete_folder(&self.folder(id)).await {
            warn!(offer_id = %id, error = %format!("{e:#}"), "failed to release orphaned offer assets");
        }
    }

    /// List one page of offers matching a raw filter.
    ///
    /// The count covers the whole filter, not just the returned page.
    pub async fn list_offers(&self, filter: &OfferFilter) -> Result<OfferPage, OfferError> {
        let query = filter.normalize()?;

        let (offers, count) = tokio::try_join!(
            self.inner.offers.list_offers(&query),
            self.inner.offers.count_offers(&query.predicate),
        )?;

        Ok(OfferPage { count, offers })
    }

    /// Load an offer together with its owner's public profile.
    pub async fn get_offer_detail(&self, id: Uuid) -> Result<OfferDetail, OfferError> {
        let offer = self
            .inner
            .offers
            .get_offer(id)
            .await?
            .ok_or(OfferError::NotFound)?;

        let owner = self.inner.users.get_user(offer.owner_id).await?;
        if owner.is_none() {
            warn!(offer_id = %id, owner_id = %offer.owner_id, "offer owner not found");
        }

        Ok(OfferDetail {
            offer,
            owner: owner.map(|user| user.profile()),
        })
    }

    /// Publish a new offer owned by the caller.
    pub async fn publish_offer(
        &self,
        caller: &CallerIdentity,
        input: NewOffer,
        image: Option<ImageUpload>,
    ) -> Result<Offer, OfferError> {
        let mut violations = Vec::new();

        let title = input.title.trim();
        if title.is_empty() {
            violations.push(FieldViolation::new("title", "title is required"));
        } else if let Err(v) = validate_name(title) {
            violations.push(v);
        }

        let description = input.description.clone().unwrap_or_default();
        if let Err(v) = validate_description(&description) {
            violations.push(v);
        }

        let price = match &input.price {
            None => {
                violations.push(FieldViolation::new("price", "price is required"));
                None
            }
            Some(raw) => validate_price_input(raw)
                .map_err(|v| violations.push(v))
                .ok(),
        };

        match &image {
            None => violations.push(FieldViolation::new("picture", "picture is required")),
            Some(upload) => {
                if let Err(v) = upload.validate("picture") {
                    violations.push(v);
                }
            }
        }

        let (Some(price), Some(image)) = (price, image) else {
            return Err(OfferError::Validation(violations));
        };
        if !violations.is_empty() {
            return Err(OfferError::Validation(violations));
        }

        let id = Uuid::now_v7();
        let stored = self
            .inner
            .assets
            .upload(&self.folder(id), &image.filename, &image.data)
            .await?;

        let now = Utc::now().timestamp();
        let offer = Offer {
            id,
            name: title.to_string(),
            description,
            price,
            details: input.details(),
            image: Some(stored),
            owner_id: caller.user_id,
            created: now,
            changed: now,
        };

        if let Err(e) = self.inner.offers.insert_offer(&offer).await {
            self.release_folder(id).await;
            return Err(e.into());
        }

        info!(offer_id = %offer.id, owner_id = %offer.owner_id, "offer published");
        Ok(offer)
    }

    /// Apply a partial update to an offer the caller owns.
    ///
    /// Every field, including the image, is validated before anything is
    /// uploaded or saved.
    pub async fn update_offer(
        &self,
        id: Uuid,
        caller: &CallerIdentity,
        changes: OfferChanges,
        image: Option<ImageUpload>,
    ) -> Result<Offer, OfferError> {
        let existing = self
            .inner
            .offers
            .get_offer(id)
            .await?
            .ok_or(OfferError::NotFound)?;

        if !caller.owns(existing.owner_id) {
            warn!(offer_id = %id, user_id = %caller.user_id, "update by non-owner rejected");
            return Err(OfferError::Forbidden);
        }

        let image_violation = image.as_ref().and_then(|i| i.validate("picture").err());
        let mut updated = match apply_update(&existing, &changes) {
            Ok(updated) if image_violation.is_none() => updated,
            Ok(_) => return Err(OfferError::Validation(image_violation.into_iter().collect())),
            Err(mut violations) => {
                violations.extend(image_violation);
                return Err(OfferError::Validation(violations));
            }
        };

        let uploaded = image.is_some();
        if let Some(image) = image {
            let stored = self
                .inner
                .assets
                .upload(&self.folder(id), &image.filename, &image.data)
                .await?;
            updated.image = Some(stored);
        }

        updated.changed = Utc::now().timestamp();

        let saved = match self.inner.offers.save_offer(&updated).await {
            Ok(saved) => saved,
            Err(e) => {
                if uploaded {
                    warn!(offer_id = %id, "update failed after picture upload, new picture left unreferenced");
                }
                return Err(e.into());
            }
        };
        if !saved {
            // Deleted concurrently: nothing references the folder any more.
            self.release_folder(id).await;
            return Err(OfferError::NotFound);
        }

        info!(offer_id = %id, "offer updated");
        Ok(updated)
    }

    /// Remove an offer the caller owns and release its assets.
    pub async fn delete_offer(&self, id: Uuid, caller: &CallerIdentity) -> Result<(), OfferError> {
        let existing = self
            .inner
            .offers
            .get_offer(id)
            .await?
            .ok_or(OfferError::NotFound)?;

        if !caller.owns(existing.owner_id) {
            warn!(offer_id = %id, user_id = %caller.user_id, "delete by non-owner rejected");
            return Err(OfferError::Forbidden);
        }

        if self.inner.offers.remove_offer(id).await?.is_none() {
            return Err(OfferError::NotFound);
        }

        self.inner.assets.delete_folder(&self.folder(id)).await?;

        info!(offer_id = %id, "offer deleted");
        Ok(())
    }
}
