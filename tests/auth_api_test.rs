mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use iqify_backend::{middleware::auth, routes, AppState};

fn setup_app() -> Router {
    common::init_test_config();
    let state = AppState::new(common::lazy_pool());

    let user_api = Router::new()
        .route("/api/auth/gate", get(routes::auth::gate))
        .layer(axum::middleware::from_fn(auth::require_auth));
    let admin_api = Router::new()
        .route("/api/webhooks/keys", get(routes::webhooks::list_keys))
        .layer(axum::middleware::from_fn(auth::require_admin));
    let reviewer_api = Router::new()
        .route(
            "/api/webhooks/events/pending-count",
            get(routes::webhooks::pending_count),
        )
        .layer(axum::middleware::from_fn(auth::require_reviewer));

    user_api
        .merge(admin_api)
        .merge(reviewer_api)
        .with_state(state)
}

fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let app = setup_app();

    let resp = app
        .clone()
        .oneshot(get_request("/api/auth/gate", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "missing_authorization");

    let resp = app
        .clone()
        .oneshot(get_request("/api/auth/gate", Some("Basic abc")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "unsupported_scheme");

    let resp = app
        .oneshot(get_request("/api/auth/gate", Some("Bearer not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "invalid_token");
}

#[tokio::test]
async fn gate_resolves_exactly_one_role_branch() {
    let app = setup_app();

    // Both flags set: admin wins.
    let token = common::mint_token(Uuid::new_v4(), true, true);
    let resp = app
        .clone()
        .oneshot(get_request("/api/auth/gate", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["landing"], "/admin");

    let token = common::mint_token(Uuid::new_v4(), false, true);
    let resp = app
        .clone()
        .oneshot(get_request("/api/auth/gate", Some(&token)))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["role"], "data_input");
    assert_eq!(body["landing"], "/data-input");

    let token = common::mint_token(Uuid::new_v4(), false, false);
    let resp = app
        .oneshot(get_request("/api/auth/gate", Some(&token)))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["role"], "user");
    assert_eq!(body["landing"], "/dashboard");
}

#[tokio::test]
async fn admin_routes_forbid_lesser_roles() {
    let app = setup_app();

    let user_token = common::mint_token(Uuid::new_v4(), false, false);
    let resp = app
        .clone()
        .oneshot(get_request("/api/webhooks/keys", Some(&user_token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // data_input is a reviewer but not an admin.
    let reviewer_token = common::mint_token(Uuid::new_v4(), false, true);
    let resp = app
        .oneshot(get_request("/api/webhooks/keys", Some(&reviewer_token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reviewer_routes_forbid_plain_users_only() {
    let app = setup_app();

    let user_token = common::mint_token(Uuid::new_v4(), false, false);
    let resp = app
        .oneshot(get_request(
            "/api/webhooks/events/pending-count",
            Some(&user_token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
