//! Order ledger (read side).
//!
//! Orders are only ever written by checkout, inside the same store
//! operation that closes the cart.

use shopping_cart_core::UserId;

use crate::db::{RepositoryError, Store};
use crate::models::Order;

/// Read access to a user's orders.
pub struct OrderLedger<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderLedger<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All orders of the user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.store.list_orders(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::{CartStore, CatalogStore, MemoryStore, UserStore};
    use crate::models::NewItem;
    use shopping_cart_core::Username;

    #[tokio::test]
    async fn test_orders_are_per_user_and_ordered() {
        let store = MemoryStore::new();
        let alice = store
            .create_user(&Username::parse("alice").unwrap(), "h")
            .await
            .unwrap();
        let bob = store
            .create_user(&Username::parse("bob").unwrap(), "h")
            .await
            .unwrap();
        let item = store.create_item(&NewItem::active("Mouse")).await.unwrap();

        for _ in 0..2 {
            store.add_item_to_active_cart(alice.id, item.id).await.unwrap();
            store.checkout_active_cart(alice.id).await.unwrap();
        }

        let ledger = OrderLedger::new(&store);
        let orders = ledger.list_orders(alice.id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].id < orders[1].id);
        assert_ne!(orders[0].cart_id, orders[1].cart_id);
        assert!(ledger.list_orders(bob.id).await.unwrap().is_empty());
    }
}
