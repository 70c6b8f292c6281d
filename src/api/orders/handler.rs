//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::order::{OrderDetail, OrderFilter};
use crate::db::repository::{OrderRepository, parse_record_id};
use crate::orders::{OrderEngine, PlaceOrderItem, StatusKind};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Explicit items; when omitted the order is placed from the caller's
    /// cart
    pub items: Option<Vec<PlaceOrderItem>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    /// "order" | "payment"
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct FilterQuery {
    pub status: Option<String>,
    pub user: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Place an order from the request body or the caller's cart
pub async fn place(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let engine = OrderEngine::new(state.get_db());
    let order = engine.place_order(&user.record_id()?, payload.items).await?;
    Ok(ok_with_message(order, "Order placed"))
}

/// Cancel a pending order owned by the caller; restores the stock
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let engine = OrderEngine::new(state.get_db());
    let order = engine.cancel_order(&id, &user.record_id()?).await?;
    Ok(ok_with_message(order, "Order cancelled"))
}

/// Update the order or payment status (admin)
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    require_admin(&user)?;
    let kind: StatusKind = payload.kind.parse()?;
    let engine = OrderEngine::new(state.get_db());
    let detail = engine.update_status(&id, &payload.status, kind).await?;
    Ok(ok_with_message(detail, "Status updated"))
}

/// Filtered order listing (admin). The category filter joins through the
/// order lines' product links.
pub async fn filter(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> AppResult<Json<AppResponse<Vec<OrderDetail>>>> {
    require_admin(&user)?;

    let filter = OrderFilter {
        status: query
            .status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(AppError::Validation)?,
        user: query
            .user
            .as_deref()
            .map(|u| parse_record_id("user", u))
            .transpose()?,
        category: query
            .category
            .as_deref()
            .map(|c| parse_record_id("category", c))
            .transpose()?,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let repo = OrderRepository::new(state.get_db());
    Ok(ok(repo.filter(filter).await?))
}

/// The caller's own orders, newest first
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<OrderDetail>>>> {
    let repo = OrderRepository::new(state.get_db());
    Ok(ok(repo.find_by_user(&user.record_id()?).await?))
}

/// One order with joins. Owners see their own orders; admins see any.
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let repo = OrderRepository::new(state.get_db());
    let detail = repo.get_detail(&id).await?;

    if !user.is_admin() {
        let caller = user.record_id()?;
        if detail.user.id.as_ref() != Some(&caller) {
            return Err(AppError::forbidden("Not your order"));
        }
    }

    Ok(ok(detail))
}

/// Soft-delete an order (admin) — orders are never hard-deleted
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    require_admin(&user)?;
    let repo = OrderRepository::new(state.get_db());
    repo.soft_delete(&id).await?;
    Ok(ok(true))
}
