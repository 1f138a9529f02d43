//! In-memory storage backend.
//!
//! Used when no database URL is configured, and as the test double for
//! services and routes. Data is lost on restart.
//!
//! Every operation holds the state mutex from start to finish, which
//! serializes all writers and makes each trait method atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use shopping_cart_core::{CartId, CartStatus, ItemId, OrderId, SessionToken, UserId, Username};

use super::{CartStore, CatalogStore, OrderStore, RepositoryError, Store, UserStore};
use crate::models::{Cart, DEFAULT_CART_NAME, Item, NewItem, Order, User};

/// In-memory store implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
struct UserRecord {
    user: User,
    password_hash: String,
    token: Option<SessionToken>,
}

#[derive(Debug)]
struct CartRecord {
    id: CartId,
    user_id: UserId,
    name: String,
    status: CartStatus,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    items: Vec<Item>,
    carts: Vec<CartRecord>,
    /// (cart, item) associations in insertion order.
    cart_items: Vec<(CartId, ItemId)>,
    orders: Vec<Order>,
}

/// Next sequential ID for a table currently holding `len` rows.
fn next_id(len: usize) -> Result<i32, RepositoryError> {
    len.checked_add(1)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| RepositoryError::DataCorruption("id space exhausted".to_owned()))
}

impl MemoryState {
    fn user_mut(&mut self, id: UserId) -> Result<&mut UserRecord, RepositoryError> {
        self.users
            .iter_mut()
            .find(|r| r.user.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn active_cart_id(&self, user_id: UserId) -> Option<CartId> {
        self.carts
            .iter()
            .find(|c| c.user_id == user_id && c.status == CartStatus::Active)
            .map(|c| c.id)
    }

    fn get_or_create_active_cart(&mut self, user_id: UserId) -> Result<CartId, RepositoryError> {
        self.user_mut(user_id)?;

        if let Some(id) = self.active_cart_id(user_id) {
            return Ok(id);
        }

        let id = CartId::new(next_id(self.carts.len())?);
        self.carts.push(CartRecord {
            id,
            user_id,
            name: DEFAULT_CART_NAME.to_owned(),
            status: CartStatus::Active,
            created_at: Utc::now(),
        });
        self.user_mut(user_id)?.user.cart_id = Some(id);

        info!(user_id = %user_id, cart_id = %id, "Created active cart");
        Ok(id)
    }

    fn append_item(&mut self, cart_id: CartId, item_id: ItemId) -> Result<(), RepositoryError> {
        if !self.items.iter().any(|i| i.id == item_id) {
            return Err(RepositoryError::NotFound);
        }

        let cart = self
            .carts
            .iter()
            .find(|c| c.id == cart_id)
            .ok_or(RepositoryError::NotFound)?;
        if !cart.status.accepts_items() {
            return Err(RepositoryError::Conflict(format!(
                "cart {cart_id} is {}",
                cart.status
            )));
        }

        self.cart_items.push((cart_id, item_id));
        Ok(())
    }

    fn cart_view(&self, record: &CartRecord) -> Cart {
        let items = self
            .cart_items
            .iter()
            .filter(|(cart_id, _)| *cart_id == record.id)
            .filter_map(|(_, item_id)| self.items.iter().find(|i| i.id == *item_id).cloned())
            .collect();

        Cart {
            id: record.id,
            user_id: record.user_id,
            name: record.name.clone(),
            status: record.status,
            items,
            created_at: record.created_at,
        }
    }

    fn cart(&self, id: CartId) -> Result<Cart, RepositoryError> {
        self.carts
            .iter()
            .find(|c| c.id == id)
            .map(|r| self.cart_view(r))
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|r| &r.user.username == username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let user = User {
            id: UserId::new(next_id(state.users.len())?),
            username: username.clone(),
            cart_id: None,
            created_at: Utc::now(),
        };
        state.users.push(UserRecord {
            user: user.clone(),
            password_hash: password_hash.to_owned(),
            token: None,
        });

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().map(|r| r.user.clone()).collect())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone()))
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|r| &r.user.username == username)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn set_session_token(
        &self,
        id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.user_mut(id)?.token = Some(token.clone());
        Ok(())
    }

    async fn get_by_session_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|r| r.token.as_ref() == Some(token))
            .map(|r| r.user.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_item(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let mut state = self.state.lock().await;
        let item = Item {
            id: ItemId::new(next_id(state.items.len())?),
            name: item.name.clone(),
            status: item.status,
            created_at: Utc::now(),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn seed_items(&self, items: &[NewItem]) -> Result<usize, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.items.is_empty() {
            return Ok(0);
        }

        for item in items {
            let id = ItemId::new(next_id(state.items.len())?);
            state.items.push(Item {
                id,
                name: item.name.clone(),
                status: item.status,
                created_at: Utc::now(),
            });
        }

        Ok(items.len())
    }

    async fn list_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.items.clone())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.items.iter().find(|i| i.id == id).cloned())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn ensure_active_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut state = self.state.lock().await;
        let cart_id = state.get_or_create_active_cart(user_id)?;
        state.cart(cart_id)
    }

    async fn add_item_to_active_cart(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Cart, RepositoryError> {
        let mut state = self.state.lock().await;

        // Check the item before touching carts so a miss creates nothing.
        if !state.items.iter().any(|i| i.id == item_id) {
            return Err(RepositoryError::NotFound);
        }

        let cart_id = state.get_or_create_active_cart(user_id)?;
        state.append_item(cart_id, item_id)?;
        state.cart(cart_id)
    }

    async fn list_carts(&self, user_id: UserId) -> Result<Vec<Cart>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .carts
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| state.cart_view(c))
            .collect())
    }

    async fn checkout_active_cart(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Order)>, RepositoryError> {
        let mut state = self.state.lock().await;

        let Some(cart_id) = state.active_cart_id(user_id) else {
            return Ok(None);
        };

        // Everything fallible happens before the first mutation.
        let order_id = OrderId::new(next_id(state.orders.len())?);
        if state.orders.iter().any(|o| o.cart_id == cart_id) {
            return Err(RepositoryError::Conflict(format!(
                "order for cart {cart_id} already exists"
            )));
        }
        state.user_mut(user_id)?.user.cart_id = None;

        if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
            cart.status = CartStatus::Ordered;
        }

        let order = Order {
            id: order_id,
            cart_id,
            user_id,
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());

        let cart = state.cart(cart_id)?;
        Ok(Some((cart, order)))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn store_with_user_and_item() -> (MemoryStore, UserId, ItemId) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&Username::parse("alice").unwrap(), "hash")
            .await
            .unwrap();
        let item = store.create_item(&NewItem::active("Laptop")).await.unwrap();
        (store, user.id, item.id)
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username() {
        let (store, _, _) = store_with_user_and_item().await;
        let result = store
            .create_user(&Username::parse("alice").unwrap(), "other")
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_session_token_is_replaced() {
        let (store, user_id, _) = store_with_user_and_item().await;
        let first = SessionToken::generate();
        let second = SessionToken::generate();

        store.set_session_token(user_id, &first).await.unwrap();
        store.set_session_token(user_id, &second).await.unwrap();

        assert!(store.get_by_session_token(&first).await.unwrap().is_none());
        let user = store.get_by_session_token(&second).await.unwrap().unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn test_ensure_active_cart_is_idempotent() {
        let (store, user_id, _) = store_with_user_and_item().await;

        let first = store.ensure_active_cart(user_id).await.unwrap();
        let second = store.ensure_active_cart(user_id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_carts(user_id).await.unwrap().len(), 1);
        let user = store.get_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.cart_id, Some(first.id));
    }

    #[tokio::test]
    async fn test_add_item_keeps_duplicates_in_order() {
        let (store, user_id, laptop) = store_with_user_and_item().await;
        let mouse = store.create_item(&NewItem::active("Mouse")).await.unwrap();

        store.add_item_to_active_cart(user_id, laptop).await.unwrap();
        store.add_item_to_active_cart(user_id, mouse.id).await.unwrap();
        let cart = store.add_item_to_active_cart(user_id, laptop).await.unwrap();

        let names: Vec<&str> = cart.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Laptop", "Mouse", "Laptop"]);
    }

    #[tokio::test]
    async fn test_add_unknown_item_creates_no_cart() {
        let (store, user_id, _) = store_with_user_and_item().await;

        let result = store
            .add_item_to_active_cart(user_id, ItemId::new(999))
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert!(store.list_carts(user_id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_create_exactly_one_active_cart() {
        let (store, user_id, item_id) = store_with_user_and_item().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add_item_to_active_cart(user_id, item_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let carts = store.list_carts(user_id).await.unwrap();
        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].status, CartStatus::Active);
        assert_eq!(carts[0].items.len(), 32);
    }

    #[tokio::test]
    async fn test_checkout_closes_cart_clears_pointer_and_records_order() {
        let (store, user_id, item_id) = store_with_user_and_item().await;
        let cart = store.add_item_to_active_cart(user_id, item_id).await.unwrap();

        let (closed, order) = store.checkout_active_cart(user_id).await.unwrap().unwrap();

        assert_eq!(closed.id, cart.id);
        assert_eq!(closed.status, CartStatus::Ordered);
        assert_eq!(order.cart_id, cart.id);
        assert_eq!(order.user_id, user_id);
        assert_eq!(store.get_user(user_id).await.unwrap().unwrap().cart_id, None);
        assert_eq!(store.list_orders(user_id).await.unwrap(), vec![order]);
    }

    #[tokio::test]
    async fn test_checkout_without_active_cart_changes_nothing() {
        let (store, user_id, _) = store_with_user_and_item().await;

        assert!(store.checkout_active_cart(user_id).await.unwrap().is_none());
        assert!(store.list_orders(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_to_ordered_cart_is_rejected() {
        let (store, user_id, item_id) = store_with_user_and_item().await;
        let cart = store.add_item_to_active_cart(user_id, item_id).await.unwrap();
        store.checkout_active_cart(user_id).await.unwrap();

        let mut state = store.state.lock().await;
        let result = state.append_item(cart.id, item_id);

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(state.cart(cart.id).unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_items_only_fills_empty_catalog() {
        let store = MemoryStore::new();
        let defaults = [NewItem::active("Laptop"), NewItem::active("Mouse")];

        assert_eq!(store.seed_items(&defaults).await.unwrap(), 2);
        assert_eq!(store.seed_items(&defaults).await.unwrap(), 0);
        assert_eq!(store.list_items().await.unwrap().len(), 2);
    }
}
