mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use iqify_backend::{routes, AppState};

fn setup_app() -> Router {
    common::init_test_config();
    let state = AppState::new(common::lazy_pool());
    Router::new()
        .route("/api/diagnostics/test", post(routes::diagnostics::test))
        .route("/api/diagnostics/delay", post(routes::diagnostics::delay))
        .route(
            "/api/diagnostics/connection",
            post(routes::diagnostics::connection),
        )
        .with_state(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_probe_has_a_fixed_shape() {
    let app = setup_app();
    let resp = app
        .oneshot(post_json("/api/diagnostics/test", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "iqify-backend");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn delay_probe_echoes_the_applied_delay() {
    let app = setup_app();

    let resp = app
        .clone()
        .oneshot(post_json("/api/diagnostics/delay", json!({ "delay_ms": 25 })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["delayed_ms"], 25);

    // Missing field defaults to no delay.
    let resp = app
        .oneshot(post_json("/api/diagnostics/delay", json!({})))
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["delayed_ms"], 0);
}

#[tokio::test]
async fn connection_probe_reports_rather_than_fails() {
    let app = setup_app();
    let resp = app
        .oneshot(post_json("/api/diagnostics/connection", json!({})))
        .await
        .unwrap();
    // Unreachable database is a finding, not an error status.
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["connected"].is_boolean());
    assert!(body["latency_ms"].is_number());
}
