#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Store tests against a live PostgreSQL database.
//!
//! Set `DATABASE_URL` to run them; without it every test returns early.
//! Each test names its rows with a fresh token so runs can share a database.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use brocante_kernel::asset::StoredAsset;
use brocante_kernel::catalog::{ListingQuery, OfferPredicate, SortOrder};
use brocante_kernel::db;
use brocante_kernel::models::{DetailKey, User};
use brocante_kernel::store::{OfferStore, PgOfferStore, PgUserStore, UserStore};
use brocante_test_utils::{test_offer, test_user};

async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() && url != "memory" => url,
        _ => {
            eprintln!("DATABASE_URL not set, skipping PostgreSQL store test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");
    db::run_migrations(&pool).await.expect("run migrations");
    Some(pool)
}

/// Unique lower-case marker used in names and emails.
fn run_token() -> String {
    Uuid::now_v7().simple().to_string()
}

async fn seed_owner(users: &PgUserStore, token: &str) -> User {
    let user = test_user(&format!("owner{token}"), token).build();
    users.insert_user(&user).await.unwrap();
    user
}

fn listing(title: &str, sort: SortOrder, page: u32, page_size: u32) -> ListingQuery {
    ListingQuery {
        predicate: OfferPredicate {
            title: title.to_string(),
            ..OfferPredicate::default()
        },
        sort,
        page,
        page_size,
    }
}

#[tokio::test]
async fn offer_round_trips_details_and_image() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let offers = PgOfferStore::new(pool);
    let token = run_token();
    let owner = seed_owner(&users, &token).await;

    let mut offer = test_offer(&format!("Veste {token}"), 35.5)
        .with_owner(owner.id)
        .with_description("laine")
        .with_details(&[(DetailKey::Size, "M"), (DetailKey::Brand, "Puma")])
        .build();
    offer.image = Some(StoredAsset {
        url: "https://cdn.test/veste.png".to_string(),
        id: "offers/veste.png".to_string(),
    });
    offers.insert_offer(&offer).await.unwrap();

    let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
    assert_eq!(stored, offer);
    let keys: Vec<_> = stored.details.keys().to_vec();
    assert_eq!(keys, vec![DetailKey::Size, DetailKey::Brand]);

    assert!(offers.get_offer(Uuid::now_v7()).await.unwrap().is_none());
}

#[tokio::test]
async fn save_reports_whether_a_row_changed() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let offers = PgOfferStore::new(pool);
    let token = run_token();
    let owner = seed_owner(&users, &token).await;

    let mut offer = test_offer(&format!("Lampe {token}"), 20.0)
        .with_owner(owner.id)
        .build();
    offers.insert_offer(&offer).await.unwrap();

    offer.price = 25.0;
    assert!(offer.details.set(DetailKey::Color, "vert"));
    offer.changed += 1;
    assert!(offers.save_offer(&offer).await.unwrap());
    assert_eq!(offers.get_offer(offer.id).await.unwrap().unwrap(), offer);

    let ghost = test_offer("ghost", 1.0).with_owner(owner.id).build();
    assert!(!offers.save_offer(&ghost).await.unwrap());
}

#[tokio::test]
async fn remove_returns_the_deleted_offer_once() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let offers = PgOfferStore::new(pool);
    let token = run_token();
    let owner = seed_owner(&users, &token).await;

    let offer = test_offer(&format!("Chaise {token}"), 12.0)
        .with_owner(owner.id)
        .with_details(&[(DetailKey::Condition, "bon")])
        .build();
    offers.insert_offer(&offer).await.unwrap();

    let removed = offers.remove_offer(offer.id).await.unwrap().unwrap();
    assert_eq!(removed, offer);
    assert!(offers.remove_offer(offer.id).await.unwrap().is_none());
    assert!(offers.get_offer(offer.id).await.unwrap().is_none());
}

#[tokio::test]
async fn listing_pages_partition_the_matches() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let offers = PgOfferStore::new(pool);
    let token = run_token();
    let owner = seed_owner(&users, &token).await;

    let prices = [40.0, 10.0, 30.0, 10.0, 50.0];
    let mut inserted = Vec::new();
    for (i, price) in prices.iter().enumerate() {
        let offer = test_offer(&format!("Item {i} {token}"), *price)
            .with_owner(owner.id)
            .build();
        offers.insert_offer(&offer).await.unwrap();
        inserted.push(offer.id);
    }

    let upper = token.to_uppercase();
    let count = offers
        .count_offers(&listing(&upper, SortOrder::Natural, 1, 2).predicate)
        .await
        .unwrap();
    assert_eq!(count, 5);

    for sort in [SortOrder::Natural, SortOrder::PriceAsc, SortOrder::PriceDesc] {
        let mut seen = Vec::new();
        for page in 1..=3 {
            let rows = offers
                .list_offers(&listing(&token, sort, page, 2))
                .await
                .unwrap();
            assert!(rows.len() <= 2);
            seen.extend(rows);
        }
        let past_end = offers.list_offers(&listing(&token, sort, 4, 2)).await.unwrap();
        assert!(past_end.is_empty());

        let mut ids: Vec<_> = seen.iter().map(|row| row.id).collect();
        match sort {
            SortOrder::Natural => assert_eq!(ids, inserted),
            SortOrder::PriceAsc => {
                assert!(seen.windows(2).all(|w| w[0].price <= w[1].price));
            }
            SortOrder::PriceDesc => {
                assert!(seen.windows(2).all(|w| w[0].price >= w[1].price));
            }
        }
        ids.sort();
        let mut expected = inserted.clone();
        expected.sort();
        assert_eq!(ids, expected);
    }
}

#[tokio::test]
async fn count_applies_price_bounds_inclusively() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let offers = PgOfferStore::new(pool);
    let token = run_token();
    let owner = seed_owner(&users, &token).await;

    for price in [5.0, 10.0, 20.0, 30.0] {
        let offer = test_offer(&format!("Vase {token}"), price)
            .with_owner(owner.id)
            .build();
        offers.insert_offer(&offer).await.unwrap();
    }

    let mut predicate = listing(&token, SortOrder::Natural, 1, 10).predicate;
    predicate.price_min = 10.0;
    predicate.price_max = 20.0;
    assert_eq!(offers.count_offers(&predicate).await.unwrap(), 2);

    predicate.price_min = 25.0;
    predicate.price_max = 15.0;
    assert_eq!(offers.count_offers(&predicate).await.unwrap(), 0);
}

#[tokio::test]
async fn title_wildcards_match_literally() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let offers = PgOfferStore::new(pool);
    let token = run_token();
    let owner = seed_owner(&users, &token).await;

    for name in [format!("Solde 100% {token}"), format!("Solde 1000 {token}")] {
        let offer = test_offer(&name, 8.0).with_owner(owner.id).build();
        offers.insert_offer(&offer).await.unwrap();
    }

    let predicate = listing(&format!("100% {token}"), SortOrder::Natural, 1, 10).predicate;
    assert_eq!(offers.count_offers(&predicate).await.unwrap(), 1);
}

#[tokio::test]
async fn user_lookups_and_updates() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool);
    let token = run_token();

    let user = test_user(&format!("ada{token}"), &token)
        .with_phone("0601020304")
        .build();
    users.insert_user(&user).await.unwrap();

    let by_email = users.find_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.phone.as_deref(), Some("0601020304"));
    assert!(by_email.verify_password("password"));

    let by_token = users
        .find_user_by_token_hash(&user.token_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_token.id, user.id);

    assert!(users.update_token_hash(user.id, "rotated").await.unwrap());
    assert!(users.find_user_by_token_hash(&user.token_hash).await.unwrap().is_none());
    assert_eq!(
        users.find_user_by_token_hash("rotated").await.unwrap().unwrap().id,
        user.id
    );

    let avatar = StoredAsset {
        url: "https://cdn.test/avatars/ada.png".to_string(),
        id: "avatars/ada.png".to_string(),
    };
    assert!(users.update_avatar(user.id, &avatar).await.unwrap());
    assert_eq!(users.get_user(user.id).await.unwrap().unwrap().avatar, Some(avatar.clone()));

    let missing = Uuid::now_v7();
    assert!(!users.update_token_hash(missing, "x").await.unwrap());
    assert!(!users.update_avatar(missing, &avatar).await.unwrap());
    assert!(users.get_user(missing).await.unwrap().is_none());
    assert!(users.find_user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool);
    let token = run_token();

    let first = test_user(&format!("bob{token}"), &token).build();
    users.insert_user(&first).await.unwrap();

    let mut second = test_user(&format!("bob{token}"), "other").build();
    second.id = Uuid::now_v7();
    assert!(users.insert_user(&second).await.is_err());
}
