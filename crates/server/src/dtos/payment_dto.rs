use serde::{Deserialize, Serialize};
use validator::Validate;

/// 支付回执, 只关心 PaymentIntent id
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct PaymentInfo {
    pub id: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct MakePaymentDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub fund_id: String,
    #[validate(range(min = 0.01, message = "Donation amount must be positive"))]
    pub amount: f64,
    #[serde(rename = "payment_info")]
    pub payment_info: Option<PaymentInfo>,
}

impl MakePaymentDto {
    /// 支付确认凭证 (PaymentIntent id)
    pub fn payment_ref(&self) -> Option<&str> {
        self.payment_info
            .as_ref()
            .and_then(|info| info.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct PaymentIntentDto {
    #[validate(range(min = 0.01))]
    pub amount: f64,
}
