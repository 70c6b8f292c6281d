//! 认证中间件
//!
//! 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
//! 验证成功后将 [`CurrentUser`] 注入请求扩展。
//!
//! # 跳过认证的路径
//!
//! - `OPTIONS *` (CORS 预检)
//! - 非 `/api/` 路径
//! - `/api/health`、`/api/auth/*` (登录/注册)
//! - 商品目录的只读浏览 (GET products/categories/brands)

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

fn is_public_route(method: &http::Method, path: &str) -> bool {
    if !path.starts_with("/api/") {
        return true;
    }
    if path == "/api/health" || path.starts_with("/api/auth/") {
        return true;
    }
    // Storefront browsing is anonymous
    *method == http::Method::GET
        && (path.starts_with("/api/products")
            || path.starts_with("/api/categories")
            || path.starts_with("/api/brands"))
}

/// Verify a bearer token from an `Authorization` header value and resolve
/// the request identity. Shared by the middleware and the extractor.
pub(crate) fn verify_bearer(
    state: &ServerState,
    auth_header: Option<&str>,
    uri: &http::Uri,
) -> Result<CurrentUser, AppError> {
    let Some(header) = auth_header else {
        security_log!("WARN", "auth_missing", uri = format!("{uri:?}"));
        return Err(AppError::unauthorized());
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    state
        .jwt_service
        .validate_token(token)
        .map(CurrentUser::from)
        .map_err(|e| {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{e}"),
                uri = format!("{uri:?}")
            );
            match e {
                crate::auth::JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            }
        })
}

/// 认证中间件 - 要求用户登录
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if is_public_route(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let user = verify_bearer(&state, auth_header.as_deref(), req.uri())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
