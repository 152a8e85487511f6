use crate::{
    auth::{generate_activation_code, PendingUser, TokenService},
    cache::{get_json, set_json, DynSessionCache},
    dtos::user_dto::{RegistrationDto, SocialAuthDto, UpdateUserDto},
    gateways::{DynImageHost, DynMailer},
};
use async_trait::async_trait;
use database::user::{
    model::{Avatar, User, UserRecord},
    repository::DynUserRepository,
};
use std::sync::Arc;
use tracing::{info, warn};
use utils::{
    password::{hash_password, verify_password},
    AppConfig, AppError, AppResult,
};

pub const AVATAR_FOLDER: &str = "avatars";
pub const AVATAR_WIDTH: u32 = 150;

pub type DynUserService = Arc<dyn UserServiceTrait + Send + Sync>;

/// 注册结果: 提示信息 + 激活 token
#[derive(Debug, Clone)]
pub struct Registration {
    pub message: String,
    pub activation_token: String,
}

/// 登录 / 刷新后的会话
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait UserServiceTrait {
    async fn register(&self, request: RegistrationDto) -> AppResult<Registration>;

    async fn activate(&self, activation_token: &str, activation_code: &str) -> AppResult<()>;

    async fn login(&self, email: &str, password: &str) -> AppResult<SessionTokens>;

    async fn logout(&self, user: &UserRecord) -> AppResult<()>;

    async fn refresh(&self, refresh_token: Option<&str>) -> AppResult<SessionTokens>;

    /// 会话优先, 缺失时回源数据库并回填缓存
    async fn me(&self, user: &UserRecord) -> AppResult<UserRecord>;

    async fn social_auth(&self, request: SocialAuthDto) -> AppResult<SessionTokens>;

    async fn update_info(&self, user: &UserRecord, request: UpdateUserDto) -> AppResult<()>;

    async fn update_avatar(&self, user: &UserRecord, request: UpdateUserDto) -> AppResult<()>;

    async fn add_created_fund(&self, user: &UserRecord, fund_id: &str) -> AppResult<()>;

    async fn get_user(&self, email: &str) -> AppResult<Option<UserRecord>>;

    async fn all_users(&self) -> AppResult<Vec<UserRecord>>;

    async fn update_role(&self, user_id: &str, role: &str) -> AppResult<UserRecord>;
}

#[derive(Clone)]
pub struct UserService {
    repository: DynUserRepository,
    sessions: DynSessionCache,
    tokens: Arc<TokenService>,
    mailer: DynMailer,
    images: DynImageHost,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(
        repository: DynUserRepository,
        sessions: DynSessionCache,
        tokens: Arc<TokenService>,
        mailer: DynMailer,
        images: DynImageHost,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            repository,
            sessions,
            tokens,
            mailer,
            images,
            config,
        }
    }

    /// 写入会话缓存 (TTL = SESSION_TTL)
    async fn store_session(&self, user: User) -> AppResult<UserRecord> {
        let record = UserRecord::from(user);
        set_json(&self.sessions, &record.id, &record, Some(self.config.session_expiry())).await?;
        Ok(record)
    }

    async fn start_session(&self, user: User) -> AppResult<SessionTokens> {
        let record = self.store_session(user).await?;
        let access_token = self.tokens.issue_access(&record.id)?;
        let refresh_token = self.tokens.issue_refresh(&record.id)?;

        Ok(SessionTokens {
            user: record,
            access_token,
            refresh_token,
        })
    }
}

#[async_trait]
impl UserServiceTrait for UserService {
    async fn register(&self, request: RegistrationDto) -> AppResult<Registration> {
        if self.repository.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let activation_code = generate_activation_code();
        let pending = PendingUser {
            name: request.name.clone(),
            email: request.email.clone(),
            password: request.password,
        };
        let activation_token = self.tokens.issue_activation(pending, &activation_code)?;

        self.mailer
            .send_activation(&request.email, &request.name, &activation_code)
            .await?;

        Ok(Registration {
            message: format!("Please check your email: {} to activate your account", request.email),
            activation_token,
        })
    }

    async fn activate(&self, activation_token: &str, activation_code: &str) -> AppResult<()> {
        let claims = self.tokens.verify_activation(activation_token)?;
        if claims.activation_code != activation_code.trim() {
            return Err(AppError::BadRequest("Invalid activation code".to_string()));
        }

        let pending = claims.user;
        if self.repository.find_by_email(&pending.email).await?.is_some() {
            return Err(AppError::Conflict(format!("{} already exists", pending.email)));
        }

        let hashed = hash_password(&pending.password)?;
        let user = User::new(&pending.email, Some(pending.name), Some(hashed), None);
        self.repository.create_user(user).await?;

        info!("✅ account activated: {}", pending.email);
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<SessionTokens> {
        let invalid = || AppError::BadRequest("Invalid email or password".to_string());

        let user = self.repository.find_by_email(email).await?.ok_or_else(invalid)?;
        let hash = user.password.as_deref().ok_or_else(invalid)?;

        if !verify_password(password.trim(), hash) {
            return Err(AppError::BadRequest("Incorrect Password".to_string()));
        }

        self.start_session(user).await
    }

    async fn logout(&self, user: &UserRecord) -> AppResult<()> {
        self.sessions.delete(&user.id).await?;
        info!("👋 user {} logged out", user.id);
        Ok(())
    }

    async fn refresh(&self, refresh_token: Option<&str>) -> AppResult<SessionTokens> {
        let refresh_token = refresh_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::BadRequest("Could not refresh token".to_string()))?;

        let claims = self.tokens.verify_refresh(refresh_token)?;

        let session: UserRecord = get_json(&self.sessions, &claims.id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Please login for access this resources!".to_string()))?;

        let access_token = self.tokens.issue_access(&claims.id)?;
        let refresh_token = self.tokens.issue_refresh(&claims.id)?;
        set_json(&self.sessions, &claims.id, &session, Some(self.config.session_expiry())).await?;

        Ok(SessionTokens {
            user: session,
            access_token,
            refresh_token,
        })
    }

    async fn me(&self, user: &UserRecord) -> AppResult<UserRecord> {
        if let Some(record) = get_json::<UserRecord>(&self.sessions, &user.id).await? {
            return Ok(record);
        }

        match self.repository.find_by_id(&user.id).await? {
            Some(found) => self.store_session(found).await,
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn social_auth(&self, request: SocialAuthDto) -> AppResult<SessionTokens> {
        let user = match self.repository.find_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                let avatar = request.avatar.map(|url| Avatar {
                    public_id: None,
                    url: Some(url),
                });
                let user = User::new(&request.email, Some(request.name), None, avatar);
                self.repository.create_user(user).await?
            }
        };

        self.start_session(user).await
    }

    async fn update_info(&self, user: &UserRecord, request: UpdateUserDto) -> AppResult<()> {
        let Some(name) = request.name.filter(|name| !name.trim().is_empty()) else {
            return Ok(());
        };

        if let Some(updated) = self.repository.update_name(&user.id, &name).await? {
            self.store_session(updated).await?;
        }
        Ok(())
    }

    async fn update_avatar(&self, user: &UserRecord, request: UpdateUserDto) -> AppResult<()> {
        let Some(image) = request.avatar.filter(|data| !data.is_empty()) else {
            return Ok(());
        };

        let current = self
            .repository
            .find_by_id(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(public_id) = current.avatar.and_then(|avatar| avatar.public_id) {
            self.images.destroy(&public_id).await?;
        }

        let avatar = self.images.upload(&image, AVATAR_FOLDER, Some(AVATAR_WIDTH)).await?;
        if let Some(updated) = self.repository.update_avatar(&user.id, avatar).await? {
            self.store_session(updated).await?;
        }
        Ok(())
    }

    async fn add_created_fund(&self, user: &UserRecord, fund_id: &str) -> AppResult<()> {
        match self.repository.add_created_fund(&user.id, fund_id).await? {
            Some(updated) => {
                self.store_session(updated).await?;
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn get_user(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let user = self.repository.find_by_email(email).await?;
        Ok(user.map(UserRecord::from))
    }

    async fn all_users(&self) -> AppResult<Vec<UserRecord>> {
        let users = self.repository.list_users().await?;
        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    async fn update_role(&self, user_id: &str, role: &str) -> AppResult<UserRecord> {
        let updated = self
            .repository
            .update_role(user_id, role)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 只刷新已登录用户的会话
        if self.sessions.get(user_id).await?.is_some() {
            return self.store_session(updated).await;
        }

        warn!("role of {} changed to {} without an active session", user_id, role);
        Ok(UserRecord::from(updated))
    }
}
