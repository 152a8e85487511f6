use crate::{
    auth::{AuthUser, TokenExtractor, TokenService},
    cache::{get_json, DynSessionCache},
    services::Services,
};
use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use database::user::model::UserRecord;
use std::sync::Arc;
use tracing::warn;
use utils::{AppError, AppResult};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

const LOGIN_REQUIRED: &str = "Please login to access this resource";

/// 会话守卫: 校验 access token 并从会话缓存加载用户
#[derive(Clone)]
pub struct AuthGuard {
    tokens: Arc<TokenService>,
    sessions: DynSessionCache,
}

impl AuthGuard {
    pub fn new(tokens: Arc<TokenService>, sessions: DynSessionCache) -> Self {
        Self { tokens, sessions }
    }

    /// Cookie 优先, 其次 `Authorization: Bearer`
    pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        jar.get(ACCESS_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .or_else(|| {
                TokenExtractor::extract_bearer_token(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
            })
    }

    pub async fn authenticate(&self, token: Option<&str>) -> AppResult<UserRecord> {
        let Some(token) = token else {
            return Err(AppError::Unauthorized(LOGIN_REQUIRED.to_string()));
        };

        // 签名错误与过期都在这里失败
        let claims = self.tokens.verify_access(token).map_err(|_| {
            warn!("access token rejected");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        if claims.id.is_empty() {
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }

        let session: Option<UserRecord> = get_json(&self.sessions, &claims.id)
            .await
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        session.ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))
    }
}

/// 需要登录的路由中间件, 通过后在请求扩展中放入 `AuthUser`
pub async fn session_guard(
    Extension(services): Extension<Services>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = AuthGuard::token_from_headers(request.headers());
    let user = services.auth.authenticate(token.as_deref()).await?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// 角色检查
pub fn authorize_roles(user: Option<&UserRecord>, roles: &[&str]) -> AppResult<()> {
    let Some(user) = user else {
        return Err(AppError::Forbidden("User not authenticated".to_string()));
    };

    match user.role.as_deref() {
        Some(role) if roles.contains(&role) => Ok(()),
        role => Err(AppError::Forbidden(format!(
            "Role: {} is not allowed to access this resource",
            role.unwrap_or_default()
        ))),
    }
}

/// 角色检查中间件, 必须放在 `session_guard` 之后
pub fn require_roles(
    roles: &'static [&'static str],
) -> impl Fn(Request, Next) -> futures::future::BoxFuture<'static, AppResult<Response>> + Clone {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let user = request.extensions().get::<AuthUser>().map(|auth| &auth.0);
            if let Err(e) = authorize_roles(user, roles) {
                warn!("role check failed: {}", e);
                return Err(e);
            }

            Ok(next.run(request).await)
        })
    }
}
