//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! cart-cli user create -u alice -p 's3cret'
//! ```

use shopping_cart_api::db::PgStore;
use shopping_cart_api::services::AuthService;

use super::{CommandError, connect};

/// Register a user directly in the database.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the username is invalid or taken, or the database fails.
pub async fn create(username: &str, password: &str) -> Result<i32, CommandError> {
    let store = PgStore::new(connect().await?);

    let user = AuthService::new(&store).register(username, password).await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(user.id.as_i32())
}
