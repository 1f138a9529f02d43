//! Shopping cart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cart-cli migrate
//!
//! # Insert the default catalog into an empty database
//! cart-cli seed items
//!
//! # Create a user
//! cart-cli user create -u alice -p 's3cret'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed items` - Seed the default catalog
//! - `user create` - Create users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Shopping cart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Debug, Subcommand)]
enum SeedTarget {
    /// Insert the default catalog items if the catalog is empty
    Items,
}

#[derive(Debug, Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Items => commands::seed::items().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create { username, password } => {
                commands::user::create(&username, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from(["cart-cli", "user", "create", "-u", "alice", "-p", "pw"])
            .unwrap();
        match cli.command {
            Commands::User {
                action: UserAction::Create { username, password },
            } => {
                assert_eq!(username, "alice");
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_seed_items() {
        let cli = Cli::try_parse_from(["cart-cli", "seed", "items"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Seed {
                target: SeedTarget::Items
            }
        ));
    }

    #[test]
    fn test_user_create_requires_password() {
        assert!(Cli::try_parse_from(["cart-cli", "user", "create", "-u", "alice"]).is_err());
    }
}
