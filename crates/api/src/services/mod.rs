//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, and the session gate
//! - `catalog` - Item catalog and default seeding
//! - `cart` - Cart lifecycle (get-or-create, add item, checkout)
//! - `orders` - Order ledger reads
//!
//! Services borrow the injected [`Store`](crate::db::Store) for the length
//! of a request and hold no state of their own.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService, DEFAULT_ITEMS};
pub use orders::OrderLedger;
