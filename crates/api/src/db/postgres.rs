//! `PostgreSQL` storage backend.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate
//! builds without a live database.
//!
//! Cart mutations run in one transaction that starts by locking the owner's
//! `users` row (`SELECT ... FOR UPDATE`). Concurrent requests for the same
//! user therefore queue up behind each other, and the partial unique index
//! `carts_one_active_per_user` rejects anything that slips past.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{error, info};

use shopping_cart_core::{
    CartId, CartStatus, ItemId, ItemStatus, OrderId, SessionToken, UserId, Username,
};

use super::{
    CartStore, CatalogStore, OrderStore, RepositoryError, Store, UserStore, conflict_on_unique,
};
use crate::models::{Cart, DEFAULT_CART_NAME, Item, NewItem, Order, User};

/// `PostgreSQL` store implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create from an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool for direct access if needed.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(FromRow)]
struct UserRow {
    id: UserId,
    username: Username,
    cart_id: Option<CartId>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            cart_id: row.cart_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(FromRow)]
struct ItemRow {
    id: ItemId,
    name: String,
    status: ItemStatus,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    name: String,
    status: CartStatus,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CartItemRow {
    cart_id: CartId,
    #[sqlx(flatten)]
    item: ItemRow,
}

#[derive(FromRow)]
struct OrderRow {
    id: OrderId,
    cart_id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Lock the user's row for the rest of the transaction.
async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    let locked: Option<UserId> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    locked.map(|_| ()).ok_or(RepositoryError::NotFound)
}

async fn find_active_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<CartRow>, RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, name, status, created_at
        FROM carts
        WHERE user_id = $1 AND status = 'active'
        ",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Get-or-create the active cart. The caller must hold the user lock.
async fn get_or_create_active_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<CartRow, RepositoryError> {
    if let Some(cart) = find_active_cart(conn, user_id).await? {
        return Ok(cart);
    }

    let cart = sqlx::query_as::<_, CartRow>(
        r"
        INSERT INTO carts (user_id, name, status)
        VALUES ($1, $2, 'active')
        RETURNING id, user_id, name, status, created_at
        ",
    )
    .bind(user_id)
    .bind(DEFAULT_CART_NAME)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| conflict_on_unique(e, "active cart"))?;

    sqlx::query("UPDATE users SET cart_id = $1 WHERE id = $2")
        .bind(cart.id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    info!(user_id = %user_id, cart_id = %cart.id, "Created active cart");
    Ok(cart)
}

/// Append one (cart, item) association if the cart is still active.
///
/// Callers hold the owner's row lock, so a closed cart is never passed in
/// through the store API. The status guard keeps ordered carts immutable
/// even if that lock is bypassed.
async fn append_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: ItemId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        INSERT INTO cart_items (cart_id, item_id)
        SELECT id, $2 FROM carts WHERE id = $1 AND status = 'active'
        ",
    )
    .bind(cart_id)
    .bind(item_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return RepositoryError::NotFound;
        }
        RepositoryError::Database(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "cart {cart_id} is not active"
        )));
    }

    Ok(())
}

/// Insert the ledger entry for a closed cart.
async fn insert_order(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: UserId,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO orders (cart_id, user_id)
        VALUES ($1, $2)
        RETURNING id, cart_id, user_id, created_at
        ",
    )
    .bind(cart_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| conflict_on_unique(e, "order for cart"))?;

    Ok(row.into())
}

/// Attach item associations to cart rows, preserving association order.
async fn load_carts(
    conn: &mut PgConnection,
    rows: Vec<CartRow>,
) -> Result<Vec<Cart>, RepositoryError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();

    let item_rows = sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT ci.cart_id, i.id, i.name, i.status, i.created_at
        FROM cart_items ci
        JOIN items i ON i.id = ci.item_id
        WHERE ci.cart_id = ANY($1)
        ORDER BY ci.id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut items_by_cart: HashMap<CartId, Vec<Item>> = HashMap::new();
    for row in item_rows {
        items_by_cart
            .entry(row.cart_id)
            .or_default()
            .push(row.item.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| Cart {
            items: items_by_cart.remove(&row.id).unwrap_or_default(),
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            status: row.status,
            created_at: row.created_at,
        })
        .collect())
}

async fn load_cart(conn: &mut PgConnection, row: CartRow) -> Result<Cart, RepositoryError> {
    load_carts(conn, vec![row])
        .await?
        .pop()
        .ok_or(RepositoryError::NotFound)
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, cart_id, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username"))?;

        Ok(row.into())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, cart_id, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, cart_id, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserCredentialRow>(
            r"
            SELECT id, username, cart_id, created_at, password_hash
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    async fn set_session_token(
        &self,
        id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET token = $1 WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "session token"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_by_session_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, cart_id, created_at FROM users WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_item(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO items (name, status)
            VALUES ($1, $2)
            RETURNING id, name, status, created_at
            ",
        )
        .bind(&item.name)
        .bind(item.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn seed_items(&self, items: &[NewItem]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent seeders so the emptiness check holds.
        sqlx::query("LOCK TABLE items IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            return Ok(0);
        }

        for item in items {
            sqlx::query("INSERT INTO items (name, status) VALUES ($1, $2)")
                .bind(&item.name)
                .bind(item.status)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(items.len())
    }

    async fn list_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, status, created_at FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, status, created_at FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn ensure_active_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        let row = get_or_create_active_cart(&mut tx, user_id).await?;
        let cart = load_cart(&mut tx, row).await?;

        tx.commit().await?;
        Ok(cart)
    }

    async fn add_item_to_active_cart(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        let row = get_or_create_active_cart(&mut tx, user_id).await?;
        append_item(&mut tx, row.id, item_id).await?;
        let cart = load_cart(&mut tx, row).await?;

        tx.commit().await?;
        Ok(cart)
    }

    async fn list_carts(&self, user_id: UserId) -> Result<Vec<Cart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, name, status, created_at
            FROM carts
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        load_carts(&mut conn, rows).await
    }

    async fn checkout_active_cart(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Order)>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        let Some(mut row) = find_active_cart(&mut tx, user_id).await? else {
            return Ok(None);
        };

        sqlx::query("UPDATE carts SET status = 'ordered' WHERE id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET cart_id = NULL WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let order = insert_order(&mut tx, row.id, user_id).await?;

        row.status = CartStatus::Ordered;
        let cart = load_cart(&mut tx, row).await?;

        tx.commit().await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "Checkout commit failed");
            RepositoryError::Database(e)
        })?;

        Ok(Some((cart, order)))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, cart_id, user_id, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use secrecy::SecretString;

    use super::*;
    use crate::db::create_pool;

    async fn store() -> PgStore {
        let url = std::env::var("CART_TEST_DATABASE_URL")
            .expect("CART_TEST_DATABASE_URL must be set for PostgreSQL tests");
        let pool = create_pool(&SecretString::from(url))
            .await
            .expect("Failed to connect to test database");
        PgStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "Requires a running PostgreSQL database"]
    async fn test_append_to_ordered_cart_is_rejected() {
        let store = store().await;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let username = Username::parse(&format!("closed-{nanos}")).unwrap();
        let user = store.create_user(&username, "hash").await.unwrap();
        let item = store.create_item(&NewItem::active("Closed Item")).await.unwrap();

        let cart = store.add_item_to_active_cart(user.id, item.id).await.unwrap();
        store.checkout_active_cart(user.id).await.unwrap().unwrap();

        let mut conn = store.pool.acquire().await.unwrap();
        let result = append_item(&mut conn, cart.id, item.id).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let carts = store.list_carts(user.id).await.unwrap();
        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].status, CartStatus::Ordered);
        assert_eq!(carts[0].items.len(), 1);
    }
}
