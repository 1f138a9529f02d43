//! End-to-end HTTP scenarios against the full router.
//!
//! Runs on the in-memory store; no external services needed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use shopping_cart_integration_tests::TestContext;

// ============================================================================
// Cart Lifecycle
// ============================================================================

#[tokio::test]
async fn test_alice_cart_to_order() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("alice", "wonderland").await;

    let (status, cart) = ctx
        .send(Method::POST, "/carts", Some(&token), Some(json!({ "item_id": 1 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["status"], "active");
    assert_eq!(cart["name"], "Shopping Cart");
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["name"], "Laptop");
    let cart_id = cart["id"].clone();

    let (status, cart) = ctx
        .send(Method::POST, "/carts", Some(&token), Some(json!({ "item_id": 1 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["id"], cart_id);
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);

    let (status, order) = ctx.send(Method::POST, "/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["cart_id"], cart_id);

    let (status, carts) = ctx.send(Method::GET, "/carts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let carts = carts.as_array().unwrap();
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["id"], cart_id);
    assert_eq!(carts[0]["status"], "ordered");

    let (status, fresh) = ctx
        .send(Method::POST, "/carts", Some(&token), Some(json!({ "item_id": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(fresh["id"], cart_id);
    assert_eq!(fresh["status"], "active");
    assert_eq!(fresh["items"][0]["name"], "Mouse");

    let (status, orders) = ctx.send(Method::GET, "/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_cart_pointer_follows_lifecycle() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("carol", "pw").await;

    let (_, cart) = ctx
        .send(Method::POST, "/carts", Some(&token), Some(json!({ "item_id": 3 })))
        .await;
    let (_, users) = ctx.send(Method::GET, "/users", None, None).await;
    assert_eq!(users[0]["cart_id"], cart["id"]);

    ctx.send(Method::POST, "/orders", Some(&token), None).await;
    let (_, users) = ctx.send(Method::GET, "/users", None, None).await;
    assert!(users[0]["cart_id"].is_null());
}

#[tokio::test]
async fn test_active_cart_endpoint_is_idempotent() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("dave", "pw").await;

    let (status, first) = ctx.send(Method::POST, "/carts/active", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["items"].as_array().unwrap().is_empty());

    let (_, second) = ctx.send(Method::POST, "/carts/active", Some(&token), None).await;
    assert_eq!(first["id"], second["id"]);
}

#[tokio::test]
async fn test_get_active_cart_creates_nothing() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("erin", "pw").await;

    let (status, _) = ctx.send(Method::GET, "/carts/active", Some(&token), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, carts) = ctx.send(Method::GET, "/carts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(carts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_carts_are_isolated_per_user() {
    let ctx = TestContext::new().await;
    let alice = ctx.signup("alice", "pw").await;
    let bob = ctx.signup("bob", "pw").await;

    ctx.send(Method::POST, "/carts", Some(&alice), Some(json!({ "item_id": 1 })))
        .await;

    let (_, carts) = ctx.send(Method::GET, "/carts", Some(&bob), None).await;
    assert!(carts.as_array().unwrap().is_empty());

    let (status, _) = ctx.send(Method::POST, "/orders", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Not Found
// ============================================================================

#[tokio::test]
async fn test_unknown_item_leaves_cart_untouched() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("erin", "pw").await;

    let (status, body) = ctx
        .send(Method::POST, "/carts", Some(&token), Some(json!({ "item_id": 999 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (_, carts) = ctx.send(Method::GET, "/carts", Some(&token), None).await;
    assert!(carts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_without_cart_creates_no_order() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("frank", "pw").await;

    let (status, body) = ctx.send(Method::POST, "/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "no active cart" }));

    let (_, orders) = ctx.send(Method::GET, "/orders", Some(&token), None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_anonymous_requests_rejected() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(Method::POST, "/carts", None, Some(json!({ "item_id": 1 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for (method, path) in [
        (Method::GET, "/carts"),
        (Method::POST, "/orders"),
        (Method::GET, "/orders"),
    ] {
        let (status, _) = ctx.send(method, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
    }

    let (_, users) = ctx.send(Method::GET, "/users", None, None).await;
    assert!(users.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_rotates_token() {
    let ctx = TestContext::new().await;
    let first = ctx.signup("grace", "pw").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "grace", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "grace");
    let second = body["token"].as_str().unwrap().to_owned();
    assert_ne!(first, second);
    assert_eq!(second.len(), 32);
    assert!(second.chars().all(|c| c.is_ascii_hexdigit()));

    let (status, _) = ctx.send(Method::GET, "/carts", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = ctx.send(Method::GET, "/carts", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_login_keeps_session() {
    let ctx = TestContext::new().await;
    let token = ctx.signup("heidi", "right").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "heidi", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    let (status, _) = ctx.send(Method::GET, "/carts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Users & Catalog
// ============================================================================

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new().await;
    ctx.signup("ivan", "pw").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({ "username": "ivan", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registration_validation() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({ "username": "", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(Method::POST, "/users", None, Some(json!({ "username": "judy" })))
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_seeded_catalog() {
    let ctx = TestContext::new().await;

    let (status, items) = ctx.send(Method::GET, "/items", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones"]);

    let (status, item) = ctx
        .send(Method::POST, "/items", None, Some(json!({ "name": "Webcam" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["status"], "active");
    assert_eq!(item["id"], 6);
}
