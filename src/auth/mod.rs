//! 认证模块
//!
//! JWT + Argon2 认证体系：
//! - [`jwt`] - 令牌签发与校验
//! - [`extractor`] - [`CurrentUser`] 提取器
//! - [`middleware`] - `require_auth` 中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, require_admin};
pub use middleware::require_auth;
