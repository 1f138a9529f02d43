//! Cart lifecycle.
//!
//! Per user: no active cart, then one active cart accumulating items, then
//! `ordered` (terminal). Each step is a single store operation, so two
//! concurrent requests for the same user never end up with two active carts.

use thiserror::Error;
use tracing::{info, instrument};

use shopping_cart_core::{ItemId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{Cart, Order};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The item is not in the catalog.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// Checkout was requested with nothing to check out.
    #[error("no active cart")]
    NoActiveCart,

    /// The cart was checked out while the item was being added.
    #[error("cart is closed")]
    CartClosed,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart lifecycle service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Return the user's active cart, creating an empty one if needed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn ensure_active_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        Ok(self.store.ensure_active_cart(user_id).await?)
    }

    /// Add one association of `item_id` to the user's active cart.
    ///
    /// Adding an item that is already in the cart adds it again.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the item doesn't exist. No cart is
    /// created in that case.
    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: UserId, item_id: ItemId) -> Result<Cart, CartError> {
        if self.store.get_item(item_id).await?.is_none() {
            return Err(CartError::ItemNotFound(item_id));
        }

        let cart = self
            .store
            .add_item_to_active_cart(user_id, item_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ItemNotFound(item_id),
                RepositoryError::Conflict(_) => CartError::CartClosed,
                other => CartError::Repository(other),
            })?;

        info!(cart_id = %cart.id, items = cart.items.len(), "Item added to cart");
        Ok(cart)
    }

    /// Every cart the user has ever owned, active and ordered.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn list_carts(&self, user_id: UserId) -> Result<Vec<Cart>, CartError> {
        Ok(self.store.list_carts(user_id).await?)
    }

    /// Close the active cart and record an order for it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoActiveCart` if there is nothing to check out.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, CartError> {
        let (cart, order) = self
            .store
            .checkout_active_cart(user_id)
            .await?
            .ok_or(CartError::NoActiveCart)?;

        info!(
            cart_id = %cart.id,
            order_id = %order.id,
            items = cart.items.len(),
            "Cart checked out"
        );
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::{CatalogStore, MemoryStore, OrderStore, UserStore};
    use crate::models::NewItem;
    use shopping_cart_core::{CartStatus, Username};

    async fn setup() -> (MemoryStore, UserId, ItemId) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&Username::parse("alice").unwrap(), "hash")
            .await
            .unwrap();
        let item = store.create_item(&NewItem::active("Laptop")).await.unwrap();
        (store, user.id, item.id)
    }

    #[tokio::test]
    async fn test_add_item_creates_cart_lazily() {
        let (store, user_id, item_id) = setup().await;
        let carts = CartService::new(&store);

        let cart = carts.add_item(user_id, item_id).await.unwrap();
        assert_eq!(cart.status, CartStatus::Active);
        assert_eq!(cart.name, "Shopping Cart");
        assert_eq!(cart.items.len(), 1);

        let cart = carts.add_item(user_id, item_id).await.unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(carts.list_carts(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_unknown_item() {
        let (store, user_id, item_id) = setup().await;
        let carts = CartService::new(&store);
        carts.add_item(user_id, item_id).await.unwrap();

        let missing = ItemId::new(999);
        assert!(matches!(
            carts.add_item(user_id, missing).await,
            Err(CartError::ItemNotFound(id)) if id == missing
        ));

        let listed = carts.list_carts(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_without_cart() {
        let (store, user_id, _) = setup().await;
        let carts = CartService::new(&store);

        assert!(matches!(
            carts.checkout(user_id).await,
            Err(CartError::NoActiveCart)
        ));
        assert!(store.list_orders(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_then_new_cart() {
        let (store, user_id, item_id) = setup().await;
        let carts = CartService::new(&store);

        let first = carts.add_item(user_id, item_id).await.unwrap();
        let order = carts.checkout(user_id).await.unwrap();
        assert_eq!(order.cart_id, first.id);
        assert_eq!(order.user_id, user_id);

        assert!(matches!(
            carts.checkout(user_id).await,
            Err(CartError::NoActiveCart)
        ));

        let second = carts.add_item(user_id, item_id).await.unwrap();
        assert_ne!(second.id, first.id);
        assert!(second.is_active());

        let listed = carts.list_carts(user_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].status, CartStatus::Ordered);
        assert_eq!(listed[1].status, CartStatus::Active);
    }

    #[tokio::test]
    async fn test_ensure_active_cart_is_idempotent() {
        let (store, user_id, _) = setup().await;
        let carts = CartService::new(&store);

        let a = carts.ensure_active_cart(user_id).await.unwrap();
        let b = carts.ensure_active_cart(user_id).await.unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.items.is_empty());

        let user = store.get_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.cart_id, Some(a.id));
    }
}
