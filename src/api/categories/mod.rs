//! Category API Module
//!
//! Categories plus their time-bounded percentage offer. Setting or clearing
//! the offer re-captures the offer prices of everything in the category.

mod handler;

use axum::{Router, routing::get, routing::put};

use crate::core::ServerState;

/// Category router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/categories", get(handler::list).post(handler::create))
        .route(
            "/api/categories/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/api/categories/{id}/offer",
            put(handler::set_offer).delete(handler::clear_offer),
        )
}
