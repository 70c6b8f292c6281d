//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::db::models::{Category, CategoryCreate, CategoryOffer, CategoryUpdate};
use crate::db::repository::{CategoryRepository, ProductRepository};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize, Validate)]
pub struct OfferRequest {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percentage: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Defaults to active; an inactive offer is stored but never applied
    pub is_active: Option<bool>,
}

/// List all categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Category>>>> {
    let repo = CategoryRepository::new(state.get_db());
    Ok(ok(repo.find_all().await?))
}

/// Get category by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Category>>> {
    let repo = CategoryRepository::new(state.get_db());
    let category = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
    Ok(ok(category))
}

/// Create a category (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<AppResponse<Category>>> {
    require_admin(&user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Category name cannot be empty"));
    }
    let repo = CategoryRepository::new(state.get_db());
    Ok(ok(repo.create(payload).await?))
}

/// Update a category (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<AppResponse<Category>>> {
    require_admin(&user)?;
    let repo = CategoryRepository::new(state.get_db());
    Ok(ok(repo.update(&id, payload).await?))
}

/// Delete a category (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    require_admin(&user)?;

    // A category with products would leave dangling record links
    let products = ProductRepository::new(state.get_db());
    if !products.find_by_category(&id).await?.is_empty() {
        return Err(AppError::BusinessRule(
            "Cannot delete a category that still has products".to_string(),
        ));
    }

    let repo = CategoryRepository::new(state.get_db());
    repo.delete(&id).await?;
    Ok(ok(true))
}

/// Attach or replace the category offer (admin), then re-capture the offer
/// prices of the category's products and variants.
pub async fn set_offer(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<OfferRequest>,
) -> AppResult<Json<AppResponse<Category>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if payload.end_date <= payload.start_date {
        return Err(AppError::validation("end_date must be after start_date"));
    }

    let offer = CategoryOffer {
        title: payload.title,
        discount_percentage: payload.discount_percentage,
        start_date: payload.start_date,
        end_date: payload.end_date,
        is_active: payload.is_active.unwrap_or(true),
    };

    let repo = CategoryRepository::new(state.get_db());
    let category = repo.set_offer(&id, offer.clone()).await?;
    let rid = category
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Category without id"))?;

    let products = ProductRepository::new(state.get_db());
    products.recapture_offer_prices(&rid, Some(&offer)).await?;

    tracing::info!(category = %rid, pct = offer.discount_percentage, "category offer set");
    Ok(ok_with_message(category, "Offer applied to category"))
}

/// Remove the category offer (admin) and reset the captured offer prices
pub async fn clear_offer(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Category>>> {
    require_admin(&user)?;

    let repo = CategoryRepository::new(state.get_db());
    let category = repo.clear_offer(&id).await?;
    let rid = category
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Category without id"))?;

    let products = ProductRepository::new(state.get_db());
    products.recapture_offer_prices(&rid, None).await?;

    tracing::info!(category = %rid, "category offer cleared");
    Ok(ok_with_message(category, "Offer removed from category"))
}
