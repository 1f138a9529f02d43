//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] shopping_cart_core::UsernameError),

    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("username already taken")]
    UserAlreadyExists,

    /// No `Token` header on a request that needs one.
    #[error("missing session token")]
    MissingToken,

    /// The presented token matches no user.
    #[error("invalid session token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
