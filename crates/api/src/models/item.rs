//! Catalog item types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopping_cart_core::{ItemId, ItemStatus};

/// A catalog entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub status: ItemStatus,
}

impl NewItem {
    /// Create an active item with the given name.
    #[must_use]
    pub fn active(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Active,
        }
    }
}
