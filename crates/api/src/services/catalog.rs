//! Catalog of purchasable items.

use thiserror::Error;
use tracing::info;

use shopping_cart_core::{ItemId, ItemStatus};

use crate::db::{RepositoryError, Store};
use crate::models::{Item, NewItem};

/// Items inserted into an empty catalog at startup.
pub const DEFAULT_ITEMS: [&str; 5] = ["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones"];

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Item name was empty or whitespace.
    #[error("item name must not be empty")]
    EmptyName,

    /// Item not found.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add an item to the catalog. `status` defaults to active.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyName` if the name is blank.
    pub async fn create_item(
        &self,
        name: &str,
        status: Option<ItemStatus>,
    ) -> Result<Item, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let item = self
            .store
            .create_item(&NewItem {
                name: name.to_owned(),
                status: status.unwrap_or_default(),
            })
            .await?;

        info!(item_id = %item.id, "Catalog item created");
        Ok(item)
    }

    /// All items in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.store.list_items().await?)
    }

    /// Get a single item.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the item doesn't exist.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Insert [`DEFAULT_ITEMS`] if the catalog is empty.
    ///
    /// Returns the number of items inserted (zero when already populated).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn seed_defaults(&self) -> Result<usize, CatalogError> {
        let items: Vec<NewItem> = DEFAULT_ITEMS.iter().copied().map(NewItem::active).collect();
        let inserted = self.store.seed_items(&items).await?;

        if inserted > 0 {
            info!(count = inserted, "Seeded default catalog");
        }
        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_create_item_defaults_to_active() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let item = catalog.create_item("  Desk  ", None).await.unwrap();
        assert_eq!(item.name, "Desk");
        assert_eq!(item.status, ItemStatus::Active);

        let hidden = catalog
            .create_item("Lamp", Some(ItemStatus::Inactive))
            .await
            .unwrap();
        assert_eq!(hidden.status, ItemStatus::Inactive);
        assert_eq!(catalog.get_item(hidden.id).await.unwrap(), hidden);
    }

    #[tokio::test]
    async fn test_create_item_rejects_blank_name() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert!(matches!(
            catalog.create_item("   ", None).await,
            Err(CatalogError::EmptyName)
        ));
        assert!(catalog.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_defaults_once() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert_eq!(catalog.seed_defaults().await.unwrap(), 5);
        assert_eq!(catalog.seed_defaults().await.unwrap(), 0);

        let names: Vec<String> = catalog
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, DEFAULT_ITEMS);
    }

    #[tokio::test]
    async fn test_get_missing_item() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        assert!(matches!(
            catalog.get_item(ItemId::new(1)).await,
            Err(CatalogError::NotFound(_))
        ));
    }
}
