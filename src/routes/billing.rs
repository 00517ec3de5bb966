use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::dto::billing_dto::{CheckoutRequest, CheckoutResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthContext;
use crate::services::billing_service::verify_signature;
use crate::AppState;

fn require_http_url(raw: &str, field: &str) -> Result<()> {
    let url =
        Url::parse(raw).map_err(|_| Error::BadRequest(format!("{} is not a valid URL", field)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::BadRequest(format!(
            "{} must use http or https",
            field
        )));
    }
    Ok(())
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    if payload.price_id.trim().is_empty() {
        return Err(Error::BadRequest("priceId is required".to_string()));
    }
    if payload.success_url.trim().is_empty() {
        return Err(Error::BadRequest("successUrl is required".to_string()));
    }
    if payload.cancel_url.trim().is_empty() {
        return Err(Error::BadRequest("cancelUrl is required".to_string()));
    }
    require_http_url(&payload.success_url, "successUrl")?;
    require_http_url(&payload.cancel_url, "cancelUrl")?;

    let session = state
        .payment_provider
        .create_checkout_session(
            &payload.price_id,
            &payload.success_url,
            &payload.cancel_url,
            &ctx.email,
        )
        .await?;

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// Provider-to-server webhook. The raw body is HMAC-verified before any
/// parsing; a bad signature causes no state change.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get("x-billing-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("missing_signature".to_string()))?;

    let secret = &crate::config::get_config().payment_webhook_secret;
    if !verify_signature(&body, signature, secret) {
        return Err(Error::Unauthorized("invalid_signature".to_string()));
    }

    let event: JsonValue = serde_json::from_slice(&body)?;
    state.billing_service.handle_event(&event).await?;
    Ok(Json(json!({ "received": true })))
}
