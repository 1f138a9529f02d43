//! Catalog seeding command.

use shopping_cart_api::db::PgStore;
use shopping_cart_api::services::CatalogService;

use super::{CommandError, connect};

/// Insert the default catalog items if the catalog is empty.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the insert fails.
pub async fn items() -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);

    let inserted = CatalogService::new(&store).seed_defaults().await?;
    if inserted == 0 {
        tracing::info!("Catalog already populated, nothing to seed");
    } else {
        tracing::info!(count = inserted, "Catalog seeded");
    }

    Ok(())
}
