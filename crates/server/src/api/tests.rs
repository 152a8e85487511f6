use crate::{router::AppRouter, test_support::TestHarness};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:3000";

fn router(harness: &TestHarness) -> Router {
    AppRouter::new(harness.services.clone())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn put_json(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 注册 + 激活 + 登录, 返回 `access_token=...` cookie
async fn login(harness: &TestHarness, email: &str) -> String {
    let app = router(harness);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/registration",
            json!({ "name": "Asha", "email": email, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let activation_token = json_body(response).await["activationToken"]
        .as_str()
        .unwrap()
        .to_string();
    let code = harness.mailer.last_code_for(email).unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/activate-user",
            json!({ "activation_token": activation_token, "activation_code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(
            "/api/v1/login",
            json!({ "email": email, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=") && c.contains("HttpOnly")));

    cookies
        .into_iter()
        .find(|c| c.starts_with("access_token="))
        .and_then(|c| c.split(';').next().map(str::to_string))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let harness = TestHarness::new();
    let response = router(&harness)
        .oneshot(get_with_cookie("/test", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "success": true, "message": "Api is working" })
    );
}

#[tokio::test]
async fn test_unknown_route_envelope_with_cors() {
    let harness = TestHarness::new();
    let request = Request::builder()
        .uri("/api/v1/nope")
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();

    let response = router(&harness).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ORIGIN
    );
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "message": "Route /api/v1/nope Not Found" })
    );
}

#[tokio::test]
async fn test_me_requires_session() {
    let harness = TestHarness::new();
    let response = router(&harness)
        .oneshot(get_with_cookie("/api/v1/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "message": "Please login to access this resource" })
    );
}

#[tokio::test]
async fn test_register_activate_login_me_over_http() {
    let harness = TestHarness::new();
    let cookie = login(&harness, "asha@example.com").await;

    let response = router(&harness)
        .oneshot(get_with_cookie("/api/v1/me", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["amountDonated"], 0.0);
    assert_eq!(body["user"]["donationsArray"], json!([]));
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let harness = TestHarness::new();
    let cookie = login(&harness, "asha@example.com").await;

    let response = router(&harness)
        .oneshot(get_with_cookie("/api/v1/get-users", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let anonymous = router(&harness)
        .oneshot(get_with_cookie("/api/v1/get-users", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_make_payment_and_read_fund() {
    let harness = TestHarness::new();
    let fund = harness.seed_fundraiser("Help Ravi", "medical").await;
    let id = fund.id_hex();
    harness.payments.succeed("pi_http");

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/make-payment",
            json!({ "email": "donor@example.com", "fundId": id, "amount": 150, "payment_info": { "id": "pi_http" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));

    let response = router(&harness)
        .oneshot(get_with_cookie(&format!("/api/v1/get-fund/{}", id), None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["fundraiser"]["amountRaised"], 150.0);
    assert_eq!(body["fundraiser"]["numberOfDonators"], 1);
    assert_eq!(body["fundraiser"]["_id"], id);
}

#[tokio::test]
async fn test_make_payment_unknown_fund() {
    let harness = TestHarness::new();
    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/make-payment",
            json!({ "email": "donor@example.com", "fundId": "64b7f0c2a1b2c3d4e5f60718", "amount": 10 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "message": "Fund not found" })
    );
}

#[tokio::test]
async fn test_invalid_body_is_bad_request() {
    let harness = TestHarness::new();
    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/contact",
            json!({ "name": "Asha", "email": "not-an-email", "message": "hi" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_health_not_under_api_prefix() {
    let harness = TestHarness::new();
    let response = router(&harness)
        .oneshot(get_with_cookie("/api/v1/test", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fundraiser_listing_response_keys() {
    let harness = TestHarness::new();
    harness.seed_fundraiser("Help Ravi", "medical").await;

    let response = router(&harness)
        .oneshot(post_json("/api/v1/fundraiserByType", json!({ "type": { "type": "medical" } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["fundraisers"].as_array().unwrap().len(), 1);

    let response = router(&harness)
        .oneshot(post_json("/api/v1/fundraiserBySearch", json!({ "search": { "search": "ravi" } })))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["fundraisers"][0]["fundraiserTitle"], "Help Ravi");
    assert!(body.get("fundraiser").is_none());
}

#[tokio::test]
async fn test_image_upload_returns_ans() {
    let harness = TestHarness::new();

    let response = router(&harness)
        .oneshot(post_json("/api/v1/addCoverImg", json!({ "avatar": "data:image/png;base64,AAAA" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ans"]["public_id"], "coverImg/img0");
    assert_eq!(body["ans"]["url"], "https://images.test/coverImg/img0.png");

    let response = router(&harness)
        .oneshot(post_json("/api/v1/addBenefitterImg", json!({ "avatar": "data:image/png;base64,AAAA" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ans"]["public_id"], "benefitter/img1");
}

#[tokio::test]
async fn test_edit_and_donated_funds_response_keys() {
    let harness = TestHarness::new();
    let cookie = login(&harness, "donor@example.com").await;
    let fund = harness.seed_fundraiser("Help Ravi", "medical").await;
    let id = fund.id_hex();

    let response = router(&harness)
        .oneshot(put_json(
            &format!("/api/v1/edit-fund/{}", id),
            &cookie,
            json!({ "fundraiserTitle": "Help Ravi walk again" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["fund"]["fundraiserTitle"], "Help Ravi walk again");

    router(&harness)
        .oneshot(post_json(
            "/api/v1/make-payment",
            json!({ "email": "donor@example.com", "fundId": id, "amount": 20 }),
        ))
        .await
        .unwrap();

    let response = router(&harness)
        .oneshot(get_with_cookie("/api/v1/getUserDonatedFunds", Some(&cookie)))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["resArray"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_pic_without_avatar() {
    let harness = TestHarness::new();
    login(&harness, "asha@example.com").await;

    let response = router(&harness)
        .oneshot(post_json("/api/v1/get-user-pic", json!({ "email": "asha@example.com" })))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await,
        json!({ "success": true, "userPic": null })
    );

    let response = router(&harness)
        .oneshot(post_json("/api/v1/get-user-pic", json!({ "email": "nobody@example.com" })))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "userPic": null })
    );
}

#[tokio::test]
async fn test_contact_returns_ok() {
    let harness = TestHarness::new();
    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/contact",
            json!({ "name": "Asha", "email": "asha@example.com", "message": "hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));
}
