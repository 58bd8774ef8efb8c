#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the offer listing endpoint.

mod common;

use std::collections::HashSet;

use axum::http::StatusCode;
use serde_json::Value;

use brocante_test_utils::{assert, test_offer};
use common::TestApp;

async fn seeded(prices: &[f64]) -> TestApp {
    let app = TestApp::new();
    for (i, price) in prices.iter().enumerate() {
        app.seed_offer(test_offer(&format!("Item {i}"), *price).build())
            .await;
    }
    app
}

fn prices(body: &Value) -> Vec<f64> {
    body["offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["price"].as_f64().unwrap())
        .collect()
}

fn ids(body: &Value) -> Vec<String> {
    body["offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Filtering and counting
// ============================================================================

#[tokio::test]
async fn price_range_page_returns_count_of_all_matches() {
    let app = seeded(&[5.0, 15.0, 30.0, 45.0, 60.0]).await;

    let (status, body) = app
        .get_json("/offers?priceMin=10&priceMax=50&pageSize=2&page=1")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let page = prices(&body);
    assert_eq!(page.len(), 2);
    assert!(page.iter().all(|p| [15.0, 30.0, 45.0].contains(p)), "{page:?}");
}

#[tokio::test]
async fn count_is_independent_of_page_and_page_size() {
    let app = seeded(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).await;

    for query in [
        "/offers?priceMin=2&priceMax=6",
        "/offers?priceMin=2&priceMax=6&page=2",
        "/offers?priceMin=2&priceMax=6&page=9&pageSize=1",
        "/offers?priceMin=2&priceMax=6&pageSize=100&sort=price-desc",
    ] {
        let (status, body) = app.get_json(query).await;
        assert_eq!(status, StatusCode::OK, "{query}");
        assert_eq!(body["count"], 5, "{query}");
    }
}

#[tokio::test]
async fn inverted_price_bounds_match_nothing() {
    let app = seeded(&[5.0, 15.0, 30.0]).await;

    let (status, body) = app.get_json("/offers?priceMin=50&priceMax=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(body["offers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn title_filter_is_case_insensitive_substring() {
    let app = TestApp::new();
    app.seed_offer(test_offer("Nike Air Max", 80.0).build()).await;
    app.seed_offer(test_offer("vintage NIKE hoodie", 40.0).build())
        .await;
    app.seed_offer(test_offer("Adidas Samba", 70.0).build()).await;

    let (_, body) = app.get_json("/offers?title=nike&pageSize=10").await;

    assert_eq!(body["count"], 2);
    let names: Vec<&str> = body["offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Nike Air Max", "vintage NIKE hoodie"]);
}

#[tokio::test]
async fn title_whitespace_is_part_of_the_substring() {
    let app = TestApp::new();
    app.seed_offer(test_offer("Nike Air Max", 80.0).build()).await;
    app.seed_offer(test_offer("Maxi dress", 25.0).build()).await;

    let (_, body) = app.get_json("/offers?title=%20max&pageSize=10").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["offers"][0]["name"], "Nike Air Max");

    let (_, body) = app.get_json("/offers?title=%20%20&pageSize=10").await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn title_wildcards_match_literally() {
    let app = TestApp::new();
    app.seed_offer(test_offer("100% cotton shirt", 10.0).build())
        .await;
    app.seed_offer(test_offer("cotton socks", 5.0).build()).await;

    let (_, body) = app.get_json("/offers?title=100%25").await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn defaults_apply_when_filter_is_empty() {
    let app = seeded(&[10.0, 20.0, 30.0, 40.0, 99_999.0]).await;

    let (status, body) = app.get_json("/offers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(prices(&body), vec![10.0, 20.0, 30.0]);
}

#[tokio::test]
async fn summaries_carry_only_id_name_and_price() {
    let app = TestApp::new();
    app.seed_offer(
        test_offer("Lamp", 12.0)
            .with_description("Brass, works fine")
            .build(),
    )
    .await;

    let (_, body) = app.get_json("/offers").await;
    let summary = &body["offers"][0];
    assert::has_key(summary, "id");
    assert::has_key(summary, "name");
    assert::has_key(summary, "price");
    assert::lacks_key(summary, "description");
    assert::lacks_key(summary, "details");
    assert::lacks_key(summary, "owner_id");
}

// ============================================================================
// Sorting and pagination
// ============================================================================

#[tokio::test]
async fn pages_partition_the_sorted_matching_set() {
    let app = seeded(&[30.0, 10.0, 30.0, 20.0, 10.0, 50.0, 30.0, 40.0]).await;

    for sort in ["", "price-asc", "price-desc"] {
        let (_, full) = app
            .get_json(&format!("/offers?sort={sort}&pageSize=100"))
            .await;
        let full_ids = ids(&full);
        assert_eq!(full_ids.len(), 8);

        let mut walked = Vec::new();
        for page in 1..=3 {
            let (_, body) = app
                .get_json(&format!("/offers?sort={sort}&pageSize=3&page={page}"))
                .await;
            walked.extend(ids(&body));
        }

        assert_eq!(walked, full_ids, "sort={sort}");
        let unique: HashSet<_> = walked.iter().collect();
        assert_eq!(unique.len(), walked.len(), "duplicates with sort={sort}");
    }
}

#[tokio::test]
async fn price_sorts_order_by_price() {
    let app = seeded(&[45.0, 5.0, 60.0, 15.0, 30.0]).await;

    let (_, asc) = app.get_json("/offers?sort=price-asc&pageSize=5").await;
    assert_eq!(prices(&asc), vec![5.0, 15.0, 30.0, 45.0, 60.0]);

    let (_, desc) = app.get_json("/offers?sort=price-desc&pageSize=5").await;
    assert_eq!(prices(&desc), vec![60.0, 45.0, 30.0, 15.0, 5.0]);
}

#[tokio::test]
async fn unspecified_sort_keeps_creation_order() {
    let app = seeded(&[45.0, 5.0, 60.0]).await;

    let (_, body) = app.get_json("/offers").await;
    assert_eq!(prices(&body), vec![45.0, 5.0, 60.0]);
}

#[tokio::test]
async fn page_below_one_is_the_first_page() {
    let app = seeded(&[1.0, 2.0, 3.0, 4.0]).await;

    let (_, first) = app.get_json("/offers?page=1").await;
    for page in ["0", "-3"] {
        let (status, body) = app.get_json(&format!("/offers?page={page}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), ids(&first), "page={page}");
    }
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let app = seeded(&[1.0, 2.0]).await;

    let (status, body) = app.get_json("/offers?page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body["offers"].as_array().unwrap().is_empty());
}

// ============================================================================
// Rejected filters
// ============================================================================

#[tokio::test]
async fn invalid_parameters_are_reported_together() {
    let app = TestApp::new();

    let (status, body) = app
        .get_json("/offers?priceMin=cheap&sort=newest&pageSize=0")
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert::violation_fields(&body, &["priceMin", "sort", "pageSize"]);
}

#[tokio::test]
async fn oversized_page_size_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/offers?pageSize=101").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert::violation_fields(&body, &["pageSize"]);
}
