//! In-process store for tests and database-less runs.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{OfferStore, UserStore};
use crate::asset::StoredAsset;
use crate::catalog::{ListingQuery, OfferPredicate, SortOrder};
use crate::models::{Offer, OfferSummary, User};

/// Offers and users held in memory.
///
/// Listing uses the same predicate and ordering as the SQL store, so both
/// backends page identically.
#[derive(Default)]
pub struct MemoryStore {
    offers: RwLock<HashMap<Uuid, Offer>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored offers.
    pub fn offer_count(&self) -> usize {
        self.offers.read().len()
    }
}

fn compare(sort: SortOrder, a: &OfferSummary, b: &OfferSummary) -> Ordering {
    let by_price = match sort {
        SortOrder::Natural => Ordering::Equal,
        SortOrder::PriceAsc => a.price.total_cmp(&b.price),
        SortOrder::PriceDesc => b.price.total_cmp(&a.price),
    };
    by_price.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl OfferStore for MemoryStore {
    async fn list_offers(&self, query: &ListingQuery) -> Result<Vec<OfferSummary>> {
        let mut matching: Vec<OfferSummary> = self
            .offers
            .read()
            .values()
            .filter(|o| query.predicate.matches(&o.name, o.price))
            .map(OfferSummary::from)
            .collect();

        matching.sort_by(|a, b| compare(query.sort, a, b));

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);

        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_offers(&self, predicate: &OfferPredicate) -> Result<u64> {
        let count = self
            .offers
            .read()
            .values()
            .filter(|o| predicate.matches(&o.name, o.price))
            .count();
        Ok(count as u64)
    }

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        Ok(self.offers.read().get(&id).cloned())
    }

    async fn insert_offer(&self, offer: &Offer) -> Result<()> {
        let mut offers = self.offers.write();
        if offers.contains_key(&offer.id) {
            bail!("offer {} already exists", offer.id);
        }
        offers.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn save_offer(&self, offer: &Offer) -> Result<bool> {
        let mut offers = self.offers.write();
        match offers.get_mut(&offer.id) {
            Some(slot) => {
                *slot = offer.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        Ok(self.offers.write().remove(&id))
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.token_hash == token_hash)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            bail!("email {} already registered", user.email);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_token_hash(&self, id: Uuid, token_hash: &str) -> Result<bool> {
        let mut users = self.users.write();
        match users.get_mut(&id) {
            Some(user) => {
                user.token_hash = token_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_avatar(&self, id: Uuid, avatar: &StoredAsset) -> Result<bool> {
        let mut users = self.users.write();
        match users.get_mut(&id) {
            Some(user) => {
                user.avatar = Some(avatar.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::OfferDetails;

    fn offer(name: &str, price: f64) -> Offer {
        Offer {
            id: Uuid::now_v7(),
            name: name.to_string(),
            description: String::new(),
            price,
            details: OfferDetails::default(),
            image: None,
            owner_id: Uuid::nil(),
            created: 0,
            changed: 0,
        }
    }

    async fn seeded(prices: &[f64]) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, price) in prices.iter().enumerate() {
            store
                .insert_offer(&offer(&format!("item {i}"), *price))
                .await
                .unwrap();
        }
        store
    }

    fn query(sort: SortOrder, page: u32, page_size: u32) -> ListingQuery {
        ListingQuery {
            sort,
            page,
            page_size,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn natural_order_is_insertion_order() {
        let store = seeded(&[30.0, 10.0, 20.0]).await;
        let page = store
            .list_offers(&query(SortOrder::Natural, 1, 10))
            .await
            .unwrap();
        let prices: Vec<f64> = page.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![30.0, 10.0, 20.0]);
    }

    #[tokio::test]
    async fn price_sort_and_pagination() {
        let store = seeded(&[45.0, 5.0, 60.0, 15.0, 30.0]).await;

        let first = store
            .list_offers(&query(SortOrder::PriceAsc, 1, 2))
            .await
            .unwrap();
        let second = store
            .list_offers(&query(SortOrder::PriceAsc, 2, 2))
            .await
            .unwrap();
        let third = store
            .list_offers(&query(SortOrder::PriceAsc, 3, 2))
            .await
            .unwrap();

        let prices: Vec<f64> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|o| o.price)
            .collect();
        assert_eq!(prices, vec![5.0, 15.0, 30.0, 45.0, 60.0]);

        let desc = store
            .list_offers(&query(SortOrder::PriceDesc, 1, 2))
            .await
            .unwrap();
        assert_eq!(desc[0].price, 60.0);
        assert_eq!(desc[1].price, 45.0);
    }

    #[tokio::test]
    async fn count_ignores_pagination() {
        let store = seeded(&[5.0, 15.0, 30.0, 45.0, 60.0]).await;
        let predicate = OfferPredicate {
            title: String::new(),
            price_min: 10.0,
            price_max: 50.0,
        };
        assert_eq!(store.count_offers(&predicate).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn save_missing_offer_returns_false() {
        let store = MemoryStore::new();
        assert!(!store.save_offer(&offer("ghost", 1.0)).await.unwrap());
    }

    #[tokio::test]
    async fn remove_returns_removed_offer() {
        let store = MemoryStore::new();
        let o = offer("lamp", 12.0);
        store.insert_offer(&o).await.unwrap();
        assert_eq!(store.remove_offer(o.id).await.unwrap(), Some(o.clone()));
        assert_eq!(store.remove_offer(o.id).await.unwrap(), None);
        assert_eq!(store.offer_count(), 0);
    }
}
