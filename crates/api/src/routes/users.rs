//! Account and login route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use shopping_cart_core::{SessionToken, UserId, Username};

use crate::error::{ApiJson, Result};
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Body of `POST /users` and `POST /users/login`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: SessionToken,
    pub user_id: UserId,
    pub username: Username,
}

/// Register a new user.
///
/// POST /users
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.store())
        .register(&body.username, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// List all users.
///
/// GET /users
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = AuthService::new(state.store()).list_users().await?;
    Ok(Json(users))
}

/// Exchange username and password for a fresh session token.
///
/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = AuthService::new(state.store())
        .login(&body.username, &body.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}
