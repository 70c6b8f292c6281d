//! Authentication Handlers
//!
//! Register (Argon2 hash) and login (JWT issue). Handlers downstream trust
//! the token identity; there is no session state.

use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Role, UserPublic};
use crate::db::repository::UserRepository;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
}

/// Register a new user (always with the `user` role; admins are promoted
/// out of band)
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let hash = hash_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let repo = UserRepository::new(state.get_db());
    let user = repo
        .create(payload.username, payload.email, hash, Role::User)
        .await?;

    tracing::info!(username = %user.username, "user registered");
    Ok(ok(UserPublic::from(user)))
}

/// Login handler — authenticates credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo.find_by_username(&payload.username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let user = match user {
        Some(u) if verify_password(&payload.password, &u.password_hash) => u,
        _ => {
            tracing::warn!(username = %payload.username, "login failed");
            return Err(AppError::invalid_credentials());
        }
    };

    if !user.is_active {
        return Err(AppError::forbidden("Account has been disabled"));
    }

    let user_id = user.id.as_ref().map(ToString::to_string).unwrap_or_default();
    let token = state
        .jwt_service
        .generate_token(&user_id, &user.username, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(user = %user_id, "login succeeded");
    Ok(ok(LoginResponse {
        token,
        user: UserPublic::from(user),
    }))
}

/// Current authenticated identity
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    let repo = UserRepository::new(state.get_db());
    let found = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ok(UserPublic::from(found)))
}
