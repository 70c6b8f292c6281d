//! Brand API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Brand router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/brands", get(handler::list).post(handler::create))
        .route(
            "/api/brands/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
