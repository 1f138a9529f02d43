//! Session gate extractor.
//!
//! Resolves the raw session token in the `Token` request header to the user
//! currently holding it. Any handler taking [`RequireUser`] rejects anonymous
//! or stale-token requests with 401 before running.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// The HTTP header carrying the session token.
pub const TOKEN_HEADER: &str = "token";

/// Extractor that requires a valid session token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A header that isn't valid UTF-8 can't match any issued token.
        let presented = parts
            .headers
            .get(TOKEN_HEADER)
            .map(HeaderValue::to_str)
            .transpose()
            .map_err(|_| AuthError::InvalidToken)?;

        let user = AuthService::new(state.store())
            .authenticate(presented)
            .await?;

        Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id, user.username.as_str());

        Ok(Self(user))
    }
}
