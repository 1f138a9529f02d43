//! Shopping Cart Core - Shared types library.
//!
//! This crate provides common types used across all shopping cart components:
//! - `api` - HTTP service exposing users, catalog, carts, and orders
//! - `cli` - Command-line tools for migrations, seeding, and user management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, statuses, usernames, and session tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
