use crate::auth::models::{ActivationClaims, PendingUser, SessionClaims};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use utils::{AppConfig, AppResult};

/// 激活码有效期
pub const ACTIVATION_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct SigningKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AppResult<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> AppResult<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<T>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

/// 令牌服务: access / refresh / activation 三类令牌各自独立的密钥
#[derive(Clone)]
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    activation: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            access: SigningKeys::from_secret(&config.access_token_secret),
            refresh: SigningKeys::from_secret(&config.refresh_token_secret),
            activation: SigningKeys::from_secret(&config.activation_secret),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    fn expires_in(ttl: Duration) -> u64 {
        Utc::now().timestamp() as u64 + ttl.as_secs()
    }

    pub fn issue_access(&self, user_id: &str) -> AppResult<String> {
        let claims = SessionClaims {
            id: user_id.to_string(),
            exp: Self::expires_in(self.access_ttl),
        };
        self.access.sign(&claims)
    }

    pub fn issue_refresh(&self, user_id: &str) -> AppResult<String> {
        let claims = SessionClaims {
            id: user_id.to_string(),
            exp: Self::expires_in(self.refresh_ttl),
        };
        self.refresh.sign(&claims)
    }

    pub fn issue_activation(&self, user: PendingUser, activation_code: &str) -> AppResult<String> {
        let claims = ActivationClaims {
            user,
            activation_code: activation_code.to_string(),
            exp: Self::expires_in(ACTIVATION_TTL),
        };
        self.activation.sign(&claims)
    }

    /// 签名或有效期校验失败时返回 `AppError::InvalidToken`
    pub fn verify_access(&self, token: &str) -> AppResult<SessionClaims> {
        self.access.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<SessionClaims> {
        self.refresh.verify(token)
    }

    pub fn verify_activation(&self, token: &str) -> AppResult<ActivationClaims> {
        self.activation.verify(token)
    }
}

/// 4 位数字激活码
pub fn generate_activation_code() -> String {
    use rand::Rng;
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// 令牌提取器
pub struct TokenExtractor;

impl TokenExtractor {
    /// 从Authorization头部提取Bearer令牌
    pub fn extract_bearer_token(auth_header: Option<&str>) -> Option<String> {
        auth_header
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}
