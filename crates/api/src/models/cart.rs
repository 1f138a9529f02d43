//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopping_cart_core::{CartId, CartStatus, UserId};

use super::Item;

/// Name given to every cart on creation.
pub const DEFAULT_CART_NAME: &str = "Shopping Cart";

/// A user's cart together with its item associations.
///
/// `items` is an ordered multiset: adding the same item twice yields two
/// entries, in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub name: String,
    pub status: CartStatus,
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Whether this cart still accepts item additions.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.accepts_items()
    }
}
