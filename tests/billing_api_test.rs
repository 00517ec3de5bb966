mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use iqify_backend::error::Result as AppResult;
use iqify_backend::middleware::auth;
use iqify_backend::services::billing_service::{CheckoutSession, PaymentProvider};
use iqify_backend::{routes, AppState};

/// Stand-in for the hosted payment API; echoes the price id back so the
/// assertions can see it crossed the seam.
struct StubProvider;

#[async_trait]
impl PaymentProvider for StubProvider {
    async fn create_checkout_session(
        &self,
        price_id: &str,
        _success_url: &str,
        _cancel_url: &str,
        _customer_email: &str,
    ) -> AppResult<CheckoutSession> {
        Ok(CheckoutSession {
            id: format!("cs_stub_{}", price_id),
            url: format!("https://pay.example/{}", price_id),
        })
    }
}

fn setup_app() -> Router {
    common::init_test_config();
    let state = AppState::with_payment_provider(common::lazy_pool(), Arc::new(StubProvider));

    let checkout = Router::new()
        .route(
            "/api/billing/checkout-session",
            post(routes::billing::create_checkout_session),
        )
        .layer(axum::middleware::from_fn(auth::require_auth));
    Router::new()
        .route("/api/billing/webhook", post(routes::billing::payment_webhook))
        .merge(checkout)
        .with_state(state)
}

fn post_json(uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header("authorization", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sign(body: &str, secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let app = setup_app();
    let resp = app
        .oneshot(post_json(
            "/api/billing/checkout-session",
            json!({ "priceId": "price_1" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_validates_fields_before_calling_the_provider() {
    let app = setup_app();
    let token = common::mint_token(Uuid::new_v4(), false, false);

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/billing/checkout-session",
            json!({ "successUrl": "https://ok", "cancelUrl": "https://no" }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "priceId is required");

    let resp = app
        .oneshot(post_json(
            "/api/billing/checkout-session",
            json!({
                "priceId": "price_1",
                "successUrl": "ftp://nope",
                "cancelUrl": "https://no",
            }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("successUrl"));
}

#[tokio::test]
async fn checkout_returns_the_provider_session() {
    let app = setup_app();
    let token = common::mint_token(Uuid::new_v4(), false, false);

    let resp = app
        .oneshot(post_json(
            "/api/billing/checkout-session",
            json!({
                "priceId": "price_premium",
                "successUrl": "https://app.example/success",
                "cancelUrl": "https://app.example/cancel",
            }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["sessionId"], "cs_stub_price_premium");
    assert_eq!(body["url"], "https://pay.example/price_premium");
}

#[tokio::test]
async fn payment_webhook_rejects_missing_and_bad_signatures() {
    let app = setup_app();
    let body = json!({ "type": "invoice.paid" }).to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/billing/webhook")
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "missing_signature");

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/billing/webhook")
                .header("x-billing-signature", sign(&body, "wrong_secret"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "invalid_signature");
}

#[tokio::test]
async fn payment_webhook_acknowledges_unhandled_event_types() {
    let app = setup_app();
    let body = json!({ "type": "invoice.paid" }).to_string();
    let signature = sign(&body, "whsec_test");

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/billing/webhook")
                .header("x-billing-signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["received"], true);
}
