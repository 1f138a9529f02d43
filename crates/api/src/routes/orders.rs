//! Order route handlers. All require a session token.

use axum::{Json, extract::State, http::StatusCode};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Order;
use crate::services::{CartService, OrderLedger};
use crate::state::AppState;

/// Check out the caller's active cart.
///
/// POST /orders
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CartService::new(state.store()).checkout(user.id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List the caller's orders.
///
/// GET /orders
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderLedger::new(state.store()).list_orders(user.id).await?;
    Ok(Json(orders))
}
