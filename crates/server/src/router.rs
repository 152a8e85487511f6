use super::services::Services;
use crate::{api, middleware};
use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
    BoxError, Extension, Json, Router,
};
use lazy_static::lazy_static;
use serde_json::json;
use std::time::Duration;
use tower::{buffer::BufferLayer, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

lazy_static! {
    static ref HTTP_TIMEOUT: u64 = 30;
}

pub struct AppRouter;

impl AppRouter {
    pub fn new(services: Services) -> Router {
        let cors = Self::cors(&services.config.base_url);

        Router::new()
            .route("/test", get(api::health))
            .nest("/api/v1", api::app())
            .fallback(Self::handle_404)
            .layer(axum_middleware::from_fn(middleware::request_logger))
            .layer(
                ServiceBuilder::new()
                    .layer(Extension(services))
                    .layer(TraceLayer::new_for_http())
                    .layer(HandleErrorLayer::new(Self::handle_timeout_error))
                    .timeout(Duration::from_secs(*HTTP_TIMEOUT))
                    .layer(BufferLayer::new(1024)),
            )
            .layer(cors)
    }

    /// 允许携带 cookie, 所以 origin 不能是 `*`; `BASE_URL=*` 时回显请求的 origin
    fn cors(base_url: &str) -> CorsLayer {
        let origin = if base_url == "*" {
            AllowOrigin::mirror_request()
        } else {
            match HeaderValue::from_str(base_url) {
                Ok(value) => AllowOrigin::exact(value),
                Err(_) => {
                    warn!("invalid BASE_URL {:?}, mirroring request origin", base_url);
                    AllowOrigin::mirror_request()
                }
            }
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::DELETE,
                Method::PUT,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                header::USER_AGENT,
            ])
            .allow_credentials(true)
    }

    async fn handle_404(uri: Uri) -> impl IntoResponse {
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": format!("Route {} Not Found", uri.path()),
            })),
        )
    }

    async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
        if err.is::<tower::timeout::error::Elapsed>() {
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(json!({
                    "success": false,
                    "message": format!(
                        "Request took longer than the configured {} second timeout",
                        *HTTP_TIMEOUT
                    ),
                })),
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("Unhandled internal error: {}", err),
                })),
            )
        }
    }
}
