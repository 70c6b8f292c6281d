//! Cart API Module
//!
//! One active cart per authenticated user. All routes operate on the
//! caller's own cart; the user id comes from the token, never the body.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Cart router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/cart", get(handler::get_cart))
        .route(
            "/api/cart/items",
            post(handler::add_item)
                .patch(handler::update_quantity)
                .delete(handler::remove_item),
        )
        .route("/api/cart/clear", post(handler::clear))
        .route(
            "/api/cart/coupon",
            post(handler::apply_coupon).delete(handler::remove_coupon),
        )
}
