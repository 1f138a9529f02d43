//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store ping)
//!
//! # Users
//! POST /users                  - Register
//! GET  /users                  - List users
//! POST /users/login            - Issue a session token
//!
//! # Catalog
//! POST /items                  - Create item
//! GET  /items                  - List items
//! GET  /items/{id}             - Show item
//!
//! # Carts (requires Token header)
//! POST /carts                  - Add item to the active cart
//! GET  /carts                  - List all carts with items
//! POST /carts/active           - Get or create the active cart
//!
//! # Orders (requires Token header)
//! POST /orders                 - Check out the active cart
//! GET  /orders                 - List orders
//! ```

pub mod carts;
pub mod items;
pub mod orders;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{REQUEST_ID_HEADER, TOKEN_HEADER, request_id_middleware};
use crate::state::AppState;

/// Build all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::register).get(users::list))
        .route("/users/login", post(users::login))
        .route("/items", post(items::create).get(items::list))
        .route("/items/{id}", get(items::show))
        .route("/carts", post(carts::add_item).get(carts::list))
        .route("/carts/active", post(carts::active))
        .route("/orders", post(orders::checkout).get(orders::list))
}

/// Build the complete application: routes, health checks, and middleware.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .fallback(not_found)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for browser clients. The custom `Token` header must be allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        // Entries were validated when the configuration was loaded.
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(TOKEN_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// JSON 404 for unknown paths.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
