//! Request identity types.
//!
//! Resolved by the session gate from the `Token` header.

use shopping_cart_core::{UserId, Username};

use super::User;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's account name.
    pub username: Username,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}
