use crate::{
    auth::{require_roles, session_guard, AuthUser, ACCESS_COOKIE, REFRESH_COOKIE},
    dtos::user_dto::{
        ActivationDto, EmailDto, LoginDto, RegistrationDto, SocialAuthDto, UpdateFundArrayDto, UpdateRoleDto,
        UpdateUserDto,
    },
    extractors::validation_extractor::ValidationExtractor,
    services::{user_service::SessionTokens, Services},
};
use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use database::user::model::ADMIN_ROLE;
use serde_json::{json, Value};
use std::time::Duration;
use utils::AppResult;

/// HttpOnly, SameSite=Lax, Path=/
fn session_cookie(name: &'static str, value: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

pub struct UserController;
impl UserController {
    pub fn app() -> Router {
        let admin = Router::new()
            .route("/get-users", get(Self::all_users))
            .route("/update-user-role", put(Self::update_role))
            .route_layer(from_fn(require_roles(&[ADMIN_ROLE])))
            .route_layer(from_fn(session_guard));

        let session = Router::new()
            .route("/logout", get(Self::logout))
            .route("/me", get(Self::me))
            .route("/update-user-info", put(Self::update_info))
            .route("/update-user-avatar", put(Self::update_avatar))
            .route("/update-user-fundArray", put(Self::update_fund_array))
            .route_layer(from_fn(session_guard));

        Router::new()
            .route("/registration", post(Self::registration))
            .route("/activate-user", post(Self::activate))
            .route("/login", post(Self::login))
            .route("/refresh", get(Self::refresh))
            .route("/socialAuth", post(Self::social_auth))
            .route("/getUser", post(Self::get_user))
            .route("/get-user-pic", post(Self::get_user_pic))
            .merge(session)
            .merge(admin)
    }

    fn with_session_cookies(services: &Services, jar: CookieJar, session: &SessionTokens) -> CookieJar {
        jar.add(session_cookie(
            ACCESS_COOKIE,
            session.access_token.clone(),
            services.config.access_ttl(),
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            session.refresh_token.clone(),
            services.config.refresh_ttl(),
        ))
    }

    pub async fn registration(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<RegistrationDto>,
    ) -> AppResult<Json<Value>> {
        let registration = services.user.register(req).await?;

        Ok(Json(json!({
            "success": true,
            "message": registration.message,
            "activationToken": registration.activation_token,
        })))
    }

    pub async fn activate(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<ActivationDto>,
    ) -> AppResult<Json<Value>> {
        services
            .user
            .activate(&req.activation_token, &req.activation_code)
            .await?;

        Ok(Json(json!({ "success": true })))
    }

    pub async fn login(
        Extension(services): Extension<Services>,
        jar: CookieJar,
        ValidationExtractor(req): ValidationExtractor<LoginDto>,
    ) -> AppResult<(CookieJar, Json<Value>)> {
        let session = services.user.login(&req.email, &req.password).await?;
        let jar = Self::with_session_cookies(&services, jar, &session);

        Ok((
            jar,
            Json(json!({
                "success": true,
                "user": session.user,
                "accessToken": session.access_token,
            })),
        ))
    }

    pub async fn logout(
        Extension(services): Extension<Services>,
        jar: CookieJar,
        AuthUser(user): AuthUser,
    ) -> AppResult<(CookieJar, Json<Value>)> {
        services.user.logout(&user).await?;
        let jar = jar
            .remove(expired_cookie(ACCESS_COOKIE))
            .remove(expired_cookie(REFRESH_COOKIE));

        Ok((
            jar,
            Json(json!({
                "success": true,
                "message": "Logged out successfully",
            })),
        ))
    }

    pub async fn refresh(
        Extension(services): Extension<Services>,
        jar: CookieJar,
    ) -> AppResult<(CookieJar, Json<Value>)> {
        let refresh_token = jar.get(REFRESH_COOKIE).map(|cookie| cookie.value().to_string());
        let session = services.user.refresh(refresh_token.as_deref()).await?;
        let jar = Self::with_session_cookies(&services, jar, &session);

        Ok((
            jar,
            Json(json!({
                "status": "success",
                "accessToken": session.access_token,
            })),
        ))
    }

    pub async fn me(Extension(services): Extension<Services>, AuthUser(user): AuthUser) -> AppResult<Json<Value>> {
        let user = services.user.me(&user).await?;

        Ok(Json(json!({ "success": true, "user": user })))
    }

    pub async fn social_auth(
        Extension(services): Extension<Services>,
        jar: CookieJar,
        ValidationExtractor(req): ValidationExtractor<SocialAuthDto>,
    ) -> AppResult<(CookieJar, Json<Value>)> {
        let session = services.user.social_auth(req).await?;
        let jar = Self::with_session_cookies(&services, jar, &session);

        Ok((
            jar,
            Json(json!({
                "success": true,
                "user": session.user,
                "accessToken": session.access_token,
            })),
        ))
    }

    pub async fn update_info(
        Extension(services): Extension<Services>,
        AuthUser(user): AuthUser,
        ValidationExtractor(req): ValidationExtractor<UpdateUserDto>,
    ) -> AppResult<Json<Value>> {
        services.user.update_info(&user, req).await?;

        Ok(Json(json!({ "success": true })))
    }

    pub async fn update_avatar(
        Extension(services): Extension<Services>,
        AuthUser(user): AuthUser,
        ValidationExtractor(req): ValidationExtractor<UpdateUserDto>,
    ) -> AppResult<Json<Value>> {
        services.user.update_avatar(&user, req).await?;

        Ok(Json(json!({ "success": true })))
    }

    pub async fn update_fund_array(
        Extension(services): Extension<Services>,
        AuthUser(user): AuthUser,
        ValidationExtractor(req): ValidationExtractor<UpdateFundArrayDto>,
    ) -> AppResult<Json<Value>> {
        services.user.add_created_fund(&user, &req.id).await?;

        Ok(Json(json!({ "success": true })))
    }

    pub async fn get_user(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<EmailDto>,
    ) -> AppResult<Json<Value>> {
        match services.user.get_user(&req.email).await? {
            Some(user) => Ok(Json(json!({ "success": true, "user": user }))),
            None => Ok(Json(json!({ "success": false, "error": "not found" }))),
        }
    }

    pub async fn get_user_pic(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<EmailDto>,
    ) -> AppResult<Json<Value>> {
        // 用户存在但没有头像时 userPic 为 null
        match services.user.get_user(&req.email).await? {
            Some(user) => {
                let picture = user.avatar.and_then(|avatar| avatar.url);
                Ok(Json(json!({ "success": true, "userPic": picture })))
            }
            None => Ok(Json(json!({ "success": false, "userPic": null }))),
        }
    }

    pub async fn all_users(Extension(services): Extension<Services>) -> AppResult<Json<Value>> {
        let users = services.user.all_users().await?;

        Ok(Json(json!({ "success": true, "users": users })))
    }

    pub async fn update_role(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<UpdateRoleDto>,
    ) -> AppResult<Json<Value>> {
        let user = services.user.update_role(&req.id, &req.role).await?;

        Ok(Json(json!({ "success": true, "user": user })))
    }
}
