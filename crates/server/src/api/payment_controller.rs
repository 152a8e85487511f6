use crate::{
    dtos::payment_dto::{MakePaymentDto, PaymentIntentDto},
    extractors::validation_extractor::ValidationExtractor,
    services::Services,
};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use utils::AppResult;

pub struct PaymentController;
impl PaymentController {
    pub fn app() -> Router {
        Router::new()
            .route("/make-payment", post(Self::make_payment))
            .route("/payment", post(Self::create_intent))
            .route("/payment/stripepublishablekey", get(Self::publishable_key))
    }

    /// 支付成功后的回调: 记录捐款
    pub async fn make_payment(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<MakePaymentDto>,
    ) -> AppResult<Json<Value>> {
        services.donation.donate(req).await?;

        Ok(Json(json!({ "success": true })))
    }

    pub async fn create_intent(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<PaymentIntentDto>,
    ) -> AppResult<Json<Value>> {
        let client_secret = services.donation.create_intent(req.amount).await?;

        Ok(Json(json!({ "success": true, "client_secret": client_secret })))
    }

    pub async fn publishable_key(Extension(services): Extension<Services>) -> Json<Value> {
        Json(json!({ "publishablekey": services.donation.publishable_key() }))
    }
}
