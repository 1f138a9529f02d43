//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopping_cart_core::{CartId, UserId, Username};

/// A registered user (domain type).
///
/// The password hash and session token live only in the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique account name.
    pub username: Username,
    /// The user's active cart, if any.
    pub cart_id: Option<CartId>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}
