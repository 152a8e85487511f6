use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use database::user::model::UserRecord;
use serde::{Deserialize, Serialize};
use utils::AppError;

/// Access / refresh token 的 claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 用户ID
    pub id: String,
    /// 过期时间
    pub exp: u64,
}

/// 注册时暂存的用户信息，随激活 token 一起签发
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// 激活 token 的 claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationClaims {
    pub user: PendingUser,
    #[serde(rename = "activationCode")]
    pub activation_code: String,
    pub exp: u64,
}

/// 通过认证的用户(来自会话缓存)
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserRecord);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Please login to access this resource".to_string()))
    }
}
