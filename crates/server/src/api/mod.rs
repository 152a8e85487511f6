pub mod contact_controller;
pub mod fundraiser_controller;
pub mod payment_controller;
pub mod user_controller;

#[cfg(test)]
mod tests;

use axum::{Json, Router};
use serde_json::{json, Value};

/// 健康检查, 挂在根路径 `/test`
pub async fn health() -> Json<Value> {
    Json(json!({ "success": true, "message": "Api is working" }))
}

pub fn app() -> Router {
    Router::new()
        .merge(contact_controller::ContactController::app())
        .merge(user_controller::UserController::app())
        .merge(fundraiser_controller::FundraiserController::app())
        .merge(payment_controller::PaymentController::app())
}
