use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct RegistrationDto {
    #[validate(length(min = 1, message = "Please enter your name"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct ActivationDto {
    #[validate(length(min = 1))]
    pub activation_token: String,
    #[validate(length(min = 1))]
    pub activation_code: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct LoginDto {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter email and password"))]
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct SocialAuthDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    /// 头像 URL
    pub avatar: Option<String>,
}

/// update-user-info 和 update-user-avatar 共用
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct UpdateUserDto {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// 图片数据 (data URI / base64)
    pub avatar: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct UpdateFundArrayDto {
    #[validate(length(min = 1))]
    pub id: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct EmailDto {
    #[validate(email)]
    pub email: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct UpdateRoleDto {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub role: String,
}
