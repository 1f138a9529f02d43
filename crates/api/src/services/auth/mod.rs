//! Authentication service and session gate.
//!
//! Registration stores an Argon2id hash of the password. Login verifies it
//! and issues a fresh [`SessionToken`] that replaces any earlier one, so only
//! the most recent login stays valid. Tokens never expire.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, instrument};

use shopping_cart_core::{SessionToken, Username};

use crate::db::{RepositoryError, Store};
use crate::models::{CurrentUser, User};

/// Authentication service.
///
/// Handles registration, login, and resolving session tokens to users.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a new user with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username is malformed.
    /// Returns `AuthError::EmptyPassword` if the password is empty.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username)?;

        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// All registered users.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.list_users().await?)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Login with username and password, issuing a new session token.
    ///
    /// The previous token (if any) stops working. A failed login leaves the
    /// stored token untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, SessionToken), AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = SessionToken::generate();
        self.store.set_session_token(user.id, &token).await?;

        info!(user_id = %user.id, "Session token issued");
        Ok((user, token))
    }

    /// Resolve a presented `Token` header value to the user holding it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` if no (or an empty) token was presented.
    /// Returns `AuthError::InvalidToken` if no user currently holds the token.
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<CurrentUser, AuthError> {
        let token = presented
            .and_then(SessionToken::from_presented)
            .ok_or(AuthError::MissingToken)?;

        self.store
            .get_by_session_token(&token)
            .await?
            .map(CurrentUser::from)
            .ok_or(AuthError::InvalidToken)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
