//! Storage layer for the shopping cart service.
//!
//! All state lives behind the [`Store`] trait. The server holds one
//! `Arc<dyn Store>` and hands it to each service, so the backing store is
//! injected rather than global.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL`, used whenever `CART_DATABASE_URL` is set
//! - [`MemoryStore`] - in-process, used for tests and local runs without a database
//!
//! # Tables
//!
//! - `users` - Accounts, password hashes, current session token, active-cart pointer
//! - `items` - The catalog
//! - `carts` - Carts; at most one `active` cart per user (partial unique index)
//! - `cart_items` - Ordered multiset of (cart, item) associations
//! - `orders` - Immutable checkout records, one per ordered cart
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shopping-cart-cli -- migrate
//! ```
//!
//! # Atomicity
//!
//! Get-or-create of the active cart, item appends, and checkout are single
//! store operations. Each backend serializes them per user: `PgStore` locks
//! the user row inside one transaction, `MemoryStore` holds its state mutex
//! for the whole operation.

pub mod memory;
pub mod postgres;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopping_cart_core::{ItemId, SessionToken, UserId, Username};

use crate::models::{Cart, Item, NewItem, Order, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username, closed cart).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Credential store: accounts, password hashes, and session tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user with an already-hashed password.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// All users in registration order.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Get a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user together with their password hash.
    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Replace the user's session token, invalidating any previous one.
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    async fn set_session_token(
        &self,
        id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError>;

    /// Find the user currently holding `token`.
    async fn get_by_session_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<User>, RepositoryError>;
}

/// Catalog storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a catalog item.
    async fn create_item(&self, item: &NewItem) -> Result<Item, RepositoryError>;

    /// Insert `items` only if the catalog is empty. Returns how many were inserted.
    async fn seed_items(&self, items: &[NewItem]) -> Result<usize, RepositoryError>;

    /// All items in insertion order.
    async fn list_items(&self) -> Result<Vec<Item>, RepositoryError>;

    /// Get an item by ID.
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError>;
}

/// Cart storage. Every method is atomic and serialized per user.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Return the user's active cart, creating it (and pointing the user at it)
    /// if none exists.
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    async fn ensure_active_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Get-or-create the active cart and append one association to `item_id`.
    ///
    /// Returns `RepositoryError::NotFound` if the user or item doesn't exist,
    /// `RepositoryError::Conflict` if the cart is no longer active.
    async fn add_item_to_active_cart(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Cart, RepositoryError>;

    /// All carts of a user, any status, in creation order.
    async fn list_carts(&self, user_id: UserId) -> Result<Vec<Cart>, RepositoryError>;

    /// Close the active cart into an order.
    ///
    /// Marks the cart `ordered`, clears the user's cart pointer, and records
    /// the order, all or nothing. Returns `None` when the user has no active
    /// cart, in which case nothing changes.
    async fn checkout_active_cart(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Order)>, RepositoryError>;
}

/// Order ledger storage (read side; orders are written by checkout).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders of a user in insertion order.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
}

/// The complete backing store injected into the application.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore + Debug {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
