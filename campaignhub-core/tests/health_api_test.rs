//! Health, documentation and cross-cutting HTTP behavior

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{build_test_router, create_test_config, get_json, TestAppState};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = get_json(&app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = build_test_router(TestAppState::new());

    let (status, _) = get_json(&app, "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = build_test_router(TestAppState::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_unknown_route_returns_json_error() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = get_json(&app, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_openapi_served_outside_production() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = get_json(&app, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/campaigns"].is_object());
}

#[tokio::test]
async fn test_openapi_hidden_in_production() {
    let mut config = create_test_config();
    config.environment = "production".to_string();
    let app = build_test_router(TestAppState::with_config(config));

    let (status, _) = get_json(&app, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
