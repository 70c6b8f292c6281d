//! Order API Module
//!
//! Placement and cancellation are user routes; the filtered listing,
//! status transitions and soft deletion are admin routes.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", get(handler::filter).post(handler::place))
        .route("/api/orders/me", get(handler::my_orders))
        .route(
            "/api/orders/{id}",
            get(handler::get_by_id).delete(handler::delete),
        )
        .route("/api/orders/{id}/status", patch(handler::update_status))
        .route("/api/orders/{id}/cancel", post(handler::cancel))
}
