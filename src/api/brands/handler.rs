//! Brand API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::db::models::{Brand, BrandCreate, BrandUpdate};
use crate::db::repository::BrandRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// List all brands
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Brand>>>> {
    let repo = BrandRepository::new(state.get_db());
    Ok(ok(repo.find_all().await?))
}

/// Get brand by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Brand>>> {
    let repo = BrandRepository::new(state.get_db());
    let brand = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Brand {id} not found")))?;
    Ok(ok(brand))
}

/// Create a brand (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BrandCreate>,
) -> AppResult<Json<AppResponse<Brand>>> {
    require_admin(&user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Brand name cannot be empty"));
    }
    let repo = BrandRepository::new(state.get_db());
    Ok(ok(repo.create(payload).await?))
}

/// Update a brand (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<BrandUpdate>,
) -> AppResult<Json<AppResponse<Brand>>> {
    require_admin(&user)?;
    let repo = BrandRepository::new(state.get_db());
    Ok(ok(repo.update(&id, payload).await?))
}

/// Delete a brand (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    require_admin(&user)?;
    let repo = BrandRepository::new(state.get_db());
    repo.delete(&id).await?;
    Ok(ok(true))
}
