//! Cart route handlers. All require a session token.

use axum::{Json, extract::State};
use serde::Deserialize;

use shopping_cart_core::ItemId;

use crate::error::{ApiJson, Result};
use crate::middleware::RequireUser;
use crate::models::Cart;
use crate::services::CartService;
use crate::state::AppState;

/// Body of `POST /carts`.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub item_id: ItemId,
}

/// Add an item to the caller's active cart, creating the cart if needed.
///
/// POST /carts
pub async fn add_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<AddToCart>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.store())
        .add_item(user.id, body.item_id)
        .await?;
    Ok(Json(cart))
}

/// List every cart the caller has owned.
///
/// GET /carts
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Cart>>> {
    let carts = CartService::new(state.store()).list_carts(user.id).await?;
    Ok(Json(carts))
}

/// Return the caller's active cart, creating an empty one if needed.
///
/// POST /carts/active
pub async fn active(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.store())
        .ensure_active_cart(user.id)
        .await?;
    Ok(Json(cart))
}
