//! Order ledger types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopping_cart_core::{CartId, OrderId, UserId};

/// An immutable record of a checked-out cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// The cart this order was closed from.
    pub cart_id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
