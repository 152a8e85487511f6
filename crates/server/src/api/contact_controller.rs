use crate::{dtos::contact_dto::ContactDto, extractors::validation_extractor::ValidationExtractor, services::Services};
use axum::{routing::post, Extension, Json, Router};
use serde_json::{json, Value};
use utils::AppResult;

pub struct ContactController;
impl ContactController {
    pub fn app() -> Router {
        Router::new().route("/contact", post(Self::contact))
    }

    pub async fn contact(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<ContactDto>,
    ) -> AppResult<Json<Value>> {
        services.contact.create(req).await?;

        Ok(Json(json!({ "success": true })))
    }
}
