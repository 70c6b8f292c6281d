//! [`CurrentUser`] 提取器
//!
//! 受保护的处理器以参数形式声明 [`CurrentUser`]；身份通常已由
//! `require_auth` 中间件放入请求扩展，未经过中间件的路由(如测试中
//! 单独挂载的路由)则直接验证 Authorization 头。

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::CurrentUser;
use crate::auth::middleware::verify_bearer;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let user = verify_bearer(state, auth_header, &parts.uri)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
