//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use shopping_cart_core::{ItemId, ItemStatus};

use crate::error::{ApiJson, Result};
use crate::models::Item;
use crate::services::CatalogService;
use crate::state::AppState;

/// Body of `POST /items`.
#[derive(Debug, Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

/// Add an item to the catalog.
///
/// POST /items
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateItem>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = CatalogService::new(state.store())
        .create_item(&body.name, body.status)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// List the catalog.
///
/// GET /items
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    let items = CatalogService::new(state.store()).list_items().await?;
    Ok(Json(items))
}

/// GET /items/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Item>> {
    let item = CatalogService::new(state.store())
        .get_item(ItemId::new(id))
        .await?;
    Ok(Json(item))
}
