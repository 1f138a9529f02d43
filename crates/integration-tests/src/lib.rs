//! Integration tests for the shopping cart service.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios (no external services)
//! cargo test -p shopping-cart-integration-tests
//!
//! # PostgreSQL-backed tests (database migrated with `cart-cli migrate`)
//! CART_TEST_DATABASE_URL=postgres://... cargo test -p shopping-cart-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_scenarios` - HTTP flows through the full router
//! - `postgres_store` - Store atomicity against a real database

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use shopping_cart_api::config::ApiConfig;
use shopping_cart_api::db::{MemoryStore, Store};
use shopping_cart_api::routes;
use shopping_cart_api::services::CatalogService;
use shopping_cart_api::state::AppState;

/// A router over a fresh store, seeded with the default catalog.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<dyn Store>,
}

impl TestContext {
    /// Build a context on the in-memory store.
    pub async fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new())).await
    }

    /// Build a context on any store.
    pub async fn with_store(store: Arc<dyn Store>) -> Self {
        CatalogService::new(store.as_ref())
            .seed_defaults()
            .await
            .unwrap();

        let app = routes::app(AppState::new(ApiConfig::default(), Arc::clone(&store)));
        Self { app, store }
    }

    /// Send a request and decode the JSON response body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request = request.header("Token", token);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register `username` and log in, returning the session token.
    pub async fn signup(&self, username: &str, password: &str) -> String {
        let credentials = serde_json::json!({ "username": username, "password": password });

        let (status, _) = self
            .send(Method::POST, "/users", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .send(Method::POST, "/users/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_owned()
    }
}
