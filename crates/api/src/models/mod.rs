//! Domain models for the shopping cart service.
//!
//! These types represent validated domain objects separate from database row
//! types. They serialize directly into API responses and never carry secrets.

pub mod cart;
pub mod item;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{Cart, DEFAULT_CART_NAME};
pub use item::{Item, NewItem};
pub use order::Order;
pub use session::CurrentUser;
pub use user::User;
