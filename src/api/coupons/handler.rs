//! Coupon API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::db::models::{Coupon, CouponCreate, CouponUpdate};
use crate::db::repository::CouponRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// List all coupons (admin)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Coupon>>>> {
    require_admin(&user)?;
    let repo = CouponRepository::new(state.get_db());
    Ok(ok(repo.find_all().await?))
}

/// Case-insensitive substring search on the coupon code (admin)
pub async fn search(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<AppResponse<Vec<Coupon>>>> {
    require_admin(&user)?;
    let repo = CouponRepository::new(state.get_db());
    Ok(ok(repo.search(&query.q).await?))
}

/// Get coupon by id (admin)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Coupon>>> {
    require_admin(&user)?;
    let repo = CouponRepository::new(state.get_db());
    let coupon = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Coupon {id} not found")))?;
    Ok(ok(coupon))
}

/// Create a coupon (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CouponCreate>,
) -> AppResult<Json<AppResponse<Coupon>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = CouponRepository::new(state.get_db());
    if repo.find_by_code(&payload.code).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Coupon code {} already exists",
            payload.code
        )));
    }
    Ok(ok(repo.create(payload).await?))
}

/// Update a coupon (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CouponUpdate>,
) -> AppResult<Json<AppResponse<Coupon>>> {
    require_admin(&user)?;
    let repo = CouponRepository::new(state.get_db());
    Ok(ok(repo.update(&id, payload).await?))
}

/// Delete a coupon (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    require_admin(&user)?;
    let repo = CouponRepository::new(state.get_db());
    repo.delete(&id).await?;
    Ok(ok(true))
}
