//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册/登录
//! - [`products`] - 商品与变体管理
//! - [`categories`] - 分类与分类折扣管理
//! - [`brands`] - 品牌管理
//! - [`coupons`] - 优惠券管理
//! - [`carts`] - 购物车
//! - [`orders`] - 订单

pub mod auth;
pub mod brands;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Compose all resource routers
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(brands::router())
        .merge(coupons::router())
        .merge(carts::router())
        .merge(orders::router())
}
