//! Order placement, rollback, and download history tests.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use pawmart::server::{BearerAuth, RouterConfig};
use pawmart::{create_router, AppState};

use super::test_utils::{
    authed_app, create_listing, default_verifier, get_json, public_app, send,
    BrokenCounterStore, MemoryListingStore, MemoryOrderStore, TestApp,
};

fn broken_counter_app() -> TestApp {
    let listings = MemoryListingStore::new();
    let orders = MemoryOrderStore::new();
    let state = AppState::new(
        BrokenCounterStore {
            inner: listings.clone(),
        },
        orders.clone(),
    );
    let router = create_router(state, RouterConfig::without_auth().with_tracing(false));
    TestApp {
        router,
        listings,
        orders,
    }
}

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
async fn test_place_order_records_order_and_counts_download() {
    let app = public_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;

    let (status, response) = send(
        &app.router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!({"downloaded_by": "a@x.com", "model_name": "Bella"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], json!(true));
    assert!(response["result"]["order_id"].is_string());
    assert_eq!(response["result"]["download_counted"], json!(true));

    assert_eq!(app.orders.len().await, 1);
    let (_, response) = get_json(&app.router, &format!("/listing/{}", listing_id)).await;
    assert_eq!(response["result"]["downloads"], json!(1));
}

#[tokio::test]
async fn test_repeated_orders_accumulate_downloads() {
    let app = public_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;

    for _ in 0..2 {
        let (status, _) = send(
            &app.router,
            Method::POST,
            &format!("/orders/{}", listing_id),
            Some(json!({"downloaded_by": "a@x.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.orders.len().await, 2);
    let (_, response) = get_json(&app.router, &format!("/listing/{}", listing_id)).await;
    assert_eq!(response["result"]["downloads"], json!(2));
}

#[tokio::test]
async fn test_order_for_missing_listing_keeps_order_but_counts_nothing() {
    let app = public_app();

    // Well-formed id with no listing behind it: the order still records,
    // the counter just has nothing to touch.
    let (status, response) = send(
        &app.router,
        Method::POST,
        "/orders/ffffffffffffffffffffffff",
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result"]["download_counted"], json!(false));
    assert_eq!(app.orders.len().await, 1);
}

#[tokio::test]
async fn test_order_with_malformed_listing_id_leaves_no_order_behind() {
    let app = public_app();

    let (status, response) = send(
        &app.router,
        Method::POST,
        "/orders/not-an-id",
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], json!(false));
    assert_eq!(app.orders.len().await, 0);
}

#[tokio::test]
async fn test_order_rejects_non_object_body() {
    let app = public_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;

    let (status, _) = send(
        &app.router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!("just a string")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.orders.len().await, 0);
}

#[tokio::test]
async fn test_failed_counter_rolls_back_order() {
    let app = broken_counter_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;

    let (status, response) = send(
        &app.router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["success"], json!(false));
    // The order written before the counter failed must be gone
    assert_eq!(app.orders.len().await, 0);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_order_then_repeat_reports_false() {
    let app = public_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;
    let (_, response) = send(
        &app.router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;
    let order_id = response["result"]["order_id"].as_str().unwrap().to_string();

    let (status, response) = send(
        &app.router,
        Method::DELETE,
        &format!("/orders/{}", order_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result"]["deleted"], json!(true));
    assert_eq!(app.orders.len().await, 0);

    let (status, response) = send(
        &app.router,
        Method::DELETE,
        &format!("/orders/{}", order_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result"]["deleted"], json!(false));
}

#[tokio::test]
async fn test_delete_order_does_not_decrement_downloads() {
    let app = public_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;
    let (_, response) = send(
        &app.router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;
    let order_id = response["result"]["order_id"].as_str().unwrap().to_string();

    send(
        &app.router,
        Method::DELETE,
        &format!("/orders/{}", order_id),
        None,
        None,
    )
    .await;

    let (_, response) = get_json(&app.router, &format!("/listing/{}", listing_id)).await;
    assert_eq!(response["result"]["downloads"], json!(1));
}

// =============================================================================
// Download History
// =============================================================================

#[tokio::test]
async fn test_my_downloads_filters_by_email_case_insensitively() {
    let app = public_app();
    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;

    for email in ["A@X.com", "a@x.com", "b@x.com"] {
        send(
            &app.router,
            Method::POST,
            &format!("/orders/{}", listing_id),
            Some(json!({"downloaded_by": email})),
            None,
        )
        .await;
    }

    let (status, response) = get_json(&app.router, "/my-downloads?email=a@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result"].as_array().unwrap().len(), 2);

    let (_, response) = get_json(&app.router, "/my-downloads?email=b@x.com").await;
    assert_eq!(response["result"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_my_downloads_uses_token_email_when_param_absent() {
    let verifier = default_verifier();
    let app = authed_app(verifier, |config| config);

    let listing_id = create_listing(&app.router, json!({"name": "Bella"})).await;
    send(
        &app.router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;

    let (status, response) = send(
        &app.router,
        Method::GET,
        "/my-downloads",
        None,
        Some("good-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result"].as_array().unwrap().len(), 1);
}

// Placing an order must never need a token even when auth is on.
#[tokio::test]
async fn test_place_order_is_public_under_auth() {
    let listings = MemoryListingStore::new();
    let orders = MemoryOrderStore::new();
    let state = AppState::new(listings, orders.clone());
    let config = RouterConfig::new(BearerAuth::new(Arc::new(default_verifier())))
        .with_tracing(false);
    let router = create_router(state, config);

    let listing_id = create_listing(&router, json!({"name": "Bella"})).await;
    let (status, _) = send(
        &router,
        Method::POST,
        &format!("/orders/{}", listing_id),
        Some(json!({"downloaded_by": "a@x.com"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.len().await, 1);
}
