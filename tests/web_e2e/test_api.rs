//! E2E tests: JSON endpoints under /api/v1.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use super::mock_aqi;
use super::test_helpers::*;

#[actix_rt::test]
async fn test_health_and_readiness() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["database"], "connected");
    assert_eq!(body["air_quality"], false);
}

#[actix_rt::test]
async fn test_air_quality_lookup() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, mock_aqi::start().await).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/air-quality?city=Paris")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["aqi"], 42);
    assert_eq!(body["tier"], "good");
    assert_eq!(body["label"], "Good");
    assert_eq!(body["station"], "Test station");
}

#[actix_rt::test]
async fn test_air_quality_without_token() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/air-quality?city=Paris")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "AQI_NOT_CONFIGURED");
    assert!(!body["message"].as_str().unwrap().contains("AQICN_TOKEN"));
}
