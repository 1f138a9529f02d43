//! Core types for the shopping cart service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod status;
pub mod token;
pub mod username;

pub use id::*;
pub use status::*;
pub use token::SessionToken;
pub use username::{Username, UsernameError};
