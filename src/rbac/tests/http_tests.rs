//! HTTP API tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dashguard_rbac::http::{create_metrics_router, create_router, AppState, CheckResponse, LandingResponse};
use dashguard_rbac::{DecisionReason, LandingReason, RbacEngine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, AppState) {
    let state = AppState::new(Arc::new(RbacEngine::new()));
    (create_router(state.clone()), state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_check_section_allowed() {
    let (app, _) = app();
    let (status, body) = post_json(
        app,
        "/v1/check",
        json!({ "roles": ["StoreKeeper"], "section": "store" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: CheckResponse = serde_json::from_slice(&body).unwrap();
    assert!(response.allowed);
    assert_eq!(response.decision, "allow");
    assert_eq!(response.reason, DecisionReason::RoleMatch { role: "StoreKeeper".into() });
    assert!(response.navigate_to.is_none());
}

#[tokio::test]
async fn test_check_required_denied() {
    let (app, _) = app();
    let (status, body) = post_json(
        app,
        "/v1/check",
        json!({ "roles": ["Merchandiser"], "required": ["Admin"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: CheckResponse = serde_json::from_slice(&body).unwrap();
    assert!(!response.allowed);
    assert_eq!(response.decision, "deny");
    assert_eq!(response.navigate_to.as_deref(), Some("/unauthorized"));
}

#[tokio::test]
async fn test_check_unknown_section() {
    let (app, _) = app();
    let (status, body) = post_json(
        app,
        "/v1/check",
        json!({ "roles": ["Admin"], "section": "payroll" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "bad_request");
    assert!(error["message"].as_str().unwrap().contains("payroll"));
}

#[tokio::test]
async fn test_check_requires_one_target() {
    let (app, _) = app();
    let (status, body) = post_json(app, "/v1/check", json!({ "roles": ["Admin"] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "bad_request");
    assert!(error["message"].as_str().unwrap().starts_with("Invalid input"));
}

#[tokio::test]
async fn test_check_rejects_both_targets() {
    let (app, _) = app();
    let (status, body) = post_json(
        app,
        "/v1/check",
        json!({ "roles": ["Admin"], "section": "accounts", "required": ["Accounts"] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "bad_request");
}

#[tokio::test]
async fn test_landing() {
    let (app, _) = app();
    let (status, body) = post_json(
        app,
        "/v1/landing",
        json!({ "roles": ["Cutting", "Accounts"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: LandingResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.path, "/cutting/dashboard");
    assert_eq!(response.reason, LandingReason::FirstMapped { role: "Cutting".into() });
}

#[tokio::test]
async fn test_policy_and_health() {
    let (app, _) = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/v1/policy").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let policy: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(policy["routes"]["login"], "/login");
    assert_eq!(policy["sections"].as_array().unwrap().len(), 10);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, state) = app();
    post_json(app, "/v1/check", json!({ "roles": ["HR"], "section": "hr" })).await;

    let response = create_metrics_router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("rbac_uptime_seconds"));
    assert!(text.contains("rbac_checks_total 1"));
    assert!(text.contains("rbac_allowed_total 1"));
}
