//! Command implementations.
//!
//! Every command talks to the `PostgreSQL` database named by
//! `CART_DATABASE_URL` (falling back to `DATABASE_URL`).

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use shopping_cart_api::db;
use shopping_cart_api::services::{AuthError, CatalogError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Account operation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error("{0}")]
    Catalog(#[from] CatalogError),
}

/// Read the database URL from the environment.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("CART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("CART_DATABASE_URL"))
}

/// Connect to the service database.
async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
