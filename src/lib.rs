//! Commerce Server - 电商后端服务
//!
//! # 架构概述
//!
//! 嵌入式 SurrealDB 之上的 REST 电商后端。核心是购物车/订单/库存
//! 一致性流程：购物车如何变成订单、库存如何原子扣减与回补、金额
//! (基础价、分类折扣价、优惠券) 如何派生并在并发请求下保持一致。
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT + Argon2 认证
//! ├── db/            # 数据库层 (models + repositories)
//! ├── pricing/       # 纯定价规则 (分类折扣 + 优惠券)
//! ├── carts/         # 购物车引擎
//! ├── orders/        # 订单引擎 (下单/取消/状态机)
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误封装、日志、密码哈希
//! ```

pub mod api;
pub mod auth;
pub mod carts;
pub mod core;
pub mod db;
pub mod orders;
pub mod pricing;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use carts::{CartEngine, QuantityAction};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderEngine, PlaceOrderItem, StatusKind};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
