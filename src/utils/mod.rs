//! 工具模块
//!
//! - [`error`] - 统一错误类型与响应封装
//! - [`logger`] - 日志初始化
//! - [`password`] - Argon2 密码哈希

pub mod error;
pub mod logger;
pub mod password;

pub use error::{AppError, AppResponse, AppResult, ok, ok_with_message};
