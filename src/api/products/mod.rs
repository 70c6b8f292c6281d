//! Product API Module
//!
//! Catalog products plus their variants (nested routes). Browsing is
//! anonymous; mutations are admin-only.

mod handler;

use axum::{Router, routing::get, routing::put};

use crate::core::ServerState;

/// Product router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/products", get(handler::list).post(handler::create))
        .route(
            "/api/products/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/api/products/{id}/variants",
            get(handler::list_variants).post(handler::create_variant),
        )
        .route(
            "/api/products/{id}/variants/{variant_id}",
            put(handler::update_variant).delete(handler::delete_variant),
        )
}
