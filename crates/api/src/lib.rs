//! Shopping cart API library.
//!
//! Users, an item catalog, per-user carts, and the orders closed from them,
//! served over HTTP. The binary in `main.rs` wires configuration, logging,
//! and the chosen store around [`routes::app`]; tests drive the same router
//! against [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
