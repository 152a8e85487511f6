use async_trait::async_trait;
use chrono::Utc;
use database::user::model::Avatar;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tracing::{error, info};
use utils::{AppConfig, AppError, AppResult};

pub const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

pub type DynImageHost = Arc<dyn ImageHostTrait + Send + Sync>;

#[async_trait]
pub trait ImageHostTrait {
    /// 上传图片(data URI / base64 / 远程 URL), 可选缩放宽度
    async fn upload(&self, data: &str, folder: &str, width: Option<u32>) -> AppResult<Avatar>;

    async fn destroy(&self, public_id: &str) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Cloudinary 签名: 参数按 key 排序拼接后加上 api secret 取 SHA-1
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct CloudinaryImageHost {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryImageHost {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.cloud_api_key.clone(),
            api_secret: config.cloud_secret_key.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", CLOUDINARY_API, self.cloud_name, action)
    }

    /// 参与签名的参数 + api_key + signature
    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign_params(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));
        params
    }

    async fn post(&self, action: &str, form: Vec<(&'static str, String)>) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint(action))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|body| body.error.message)
            .unwrap_or_else(|_| format!("image host returned {}", status));
        error!("❌ cloudinary {} failed: {}", action, message);
        Err(AppError::Upstream(message))
    }
}

#[async_trait]
impl ImageHostTrait for CloudinaryImageHost {
    async fn upload(&self, data: &str, folder: &str, width: Option<u32>) -> AppResult<Avatar> {
        let mut params = vec![
            ("folder", folder.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        if let Some(width) = width {
            params.push(("transformation", format!("w_{}", width)));
        }

        let mut form = self.signed_form(params);
        form.push(("file", data.to_string()));

        let uploaded: UploadResponse = self
            .post("upload", form)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid upload response: {}", e)))?;

        info!("🖼️ image uploaded: {}", uploaded.public_id);
        Ok(Avatar {
            public_id: Some(uploaded.public_id),
            url: Some(uploaded.secure_url),
        })
    }

    async fn destroy(&self, public_id: &str) -> AppResult<()> {
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        self.post("destroy", self.signed_form(params)).await?;

        info!("🗑️ image destroyed: {}", public_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_params_sorted_and_stable() {
        let a = sign_params(
            &[("timestamp", "1315060510".to_string()), ("public_id", "sample".to_string())],
            "abcd",
        );
        let b = sign_params(
            &[("public_id", "sample".to_string()), ("timestamp", "1315060510".to_string())],
            "abcd",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_sign_params_known_value() {
        // sha1("public_id=sample&timestamp=1315060510abcd")
        let signature = sign_params(
            &[("public_id", "sample".to_string()), ("timestamp", "1315060510".to_string())],
            "abcd",
        );
        let mut hasher = Sha1::new();
        hasher.update(b"public_id=sample&timestamp=1315060510abcd");
        assert_eq!(signature, hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_signed_form_appends_credentials() {
        let host = CloudinaryImageHost::new(&AppConfig::new_for_test());
        let form = host.signed_form(vec![("public_id", "x".to_string())]);
        assert!(form.iter().any(|(k, v)| *k == "api_key" && v == "key"));
        assert!(form.iter().any(|(k, _)| *k == "signature"));
        assert_eq!(host.endpoint("upload"), "https://api.cloudinary.com/v1_1/demo/image/upload");
    }
}
