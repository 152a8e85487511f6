use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utils::{AppError, AppResult};

pub const STRIPE_API: &str = "https://api.stripe.com/v1";
pub const SUCCEEDED: &str = "succeeded";

pub type DynPaymentGateway = Arc<dyn PaymentGatewayTrait + Send + Sync>;

#[async_trait]
pub trait PaymentGatewayTrait {
    /// PaymentIntent 当前状态, 例如 `succeeded`
    async fn intent_status(&self, intent_id: &str) -> AppResult<String>;

    /// 创建 PaymentIntent, 返回 client_secret
    async fn create_intent(&self, amount_minor: i64, currency: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Self {
        Self::with_base_url(secret_key, STRIPE_API)
    }

    pub fn with_base_url(secret_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn parse(response: reqwest::Response) -> AppResult<PaymentIntent> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<PaymentIntent>()
                .await
                .map_err(|e| AppError::Upstream(format!("invalid payment response: {}", e)));
        }

        let message = response
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| format!("payment provider returned {}", status));
        error!("❌ stripe request failed: {}", message);
        Err(AppError::Upstream(message))
    }
}

/// PaymentIntent id 形如 `pi_...`, 只允许字母数字和下划线
pub fn is_intent_id(intent_id: &str) -> bool {
    intent_id
        .strip_prefix("pi_")
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(false)
}

pub fn intent_form(amount_minor: i64, currency: &str) -> Vec<(&'static str, String)> {
    vec![
        ("amount", amount_minor.to_string()),
        ("currency", currency.to_lowercase()),
        ("description", "HopeFund donation services".to_string()),
        ("metadata[company]", "HopeFund".to_string()),
        ("automatic_payment_methods[enabled]", "true".to_string()),
    ]
}

#[async_trait]
impl PaymentGatewayTrait for StripeGateway {
    async fn intent_status(&self, intent_id: &str) -> AppResult<String> {
        if !is_intent_id(intent_id) {
            return Err(AppError::BadRequest(format!("Invalid payment reference: {}", intent_id)));
        }

        let response = self
            .client
            .get(format!("{}/payment_intents/{}", self.base_url, intent_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let intent = Self::parse(response).await?;
        info!("💳 payment intent {} status: {}", intent.id, intent.status);
        Ok(intent.status)
    }

    async fn create_intent(&self, amount_minor: i64, currency: &str) -> AppResult<String> {
        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&intent_form(amount_minor, currency))
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let intent = Self::parse(response).await?;
        info!("💳 payment intent {} created", intent.id);
        intent
            .client_secret
            .ok_or_else(|| AppError::Upstream("payment intent has no client secret".to_string()))
    }
}
