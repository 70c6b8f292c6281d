//! Cart API Handlers
//!
//! Thin HTTP shims over [`CartEngine`] — parsing, identity, and the
//! response envelope live here; the cart rules live in the engine.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::carts::{CartEngine, QuantityAction};
use crate::core::ServerState;
use crate::db::models::{Cart, CartView};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

fn engine(state: &ServerState) -> CartEngine {
    CartEngine::new(state.get_db(), state.config.refresh_price_on_read)
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Defaults to 1
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ItemKeyRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    /// "increment" | "decrement"
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// Get the caller's cart with catalog joins, total quantity and the amount
/// actually payable
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<CartView>>> {
    let cart = engine(&state).get_cart(&user.record_id()?).await?;
    Ok(ok(cart))
}

/// Add a product (or variant) to the cart
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = engine(&state)
        .add_item(
            &user.record_id()?,
            &payload.product_id,
            payload.variant_id.as_deref(),
            payload.quantity.unwrap_or(1),
        )
        .await?;
    Ok(ok_with_message(cart, "Item added to cart"))
}

/// Remove a line item by its `(product, variant|None)` key
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ItemKeyRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = engine(&state)
        .remove_item(
            &user.record_id()?,
            &payload.product_id,
            payload.variant_id.as_deref(),
        )
        .await?;
    Ok(ok_with_message(cart, "Item removed from cart"))
}

/// Adjust a line item's quantity by ±1
pub async fn update_quantity(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    let action: QuantityAction = payload.action.parse()?;
    let cart = engine(&state)
        .update_quantity(
            &user.record_id()?,
            &payload.product_id,
            payload.variant_id.as_deref(),
            action,
        )
        .await?;
    Ok(ok(cart))
}

/// Empty the cart
pub async fn clear(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = engine(&state).clear(&user.record_id()?).await?;
    Ok(ok_with_message(cart, "Cart cleared"))
}

/// Apply a coupon by code
pub async fn apply_coupon(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = engine(&state)
        .apply_coupon(&user.record_id()?, &payload.code)
        .await?;
    Ok(ok_with_message(cart, "Coupon applied"))
}

/// Remove an applied coupon
pub async fn remove_coupon(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = engine(&state).remove_coupon(&user.record_id()?).await?;
    Ok(ok_with_message(cart, "Coupon removed"))
}
