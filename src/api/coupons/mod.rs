//! Coupon API Module
//!
//! Coupon administration. Application onto a cart lives in the cart routes.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Coupon router (admin-only, enforced in the handlers)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/coupons", get(handler::list).post(handler::create))
        .route("/api/coupons/search", get(handler::search))
        .route(
            "/api/coupons/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
