use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::AppState;

const MAX_DELAY_MS: u64 = 10_000;

/// Fixed-shape connectivity probe; no auth by design.
pub async fn test() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "iqify-backend",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DelayRequest {
    #[serde(default)]
    pub delay_ms: u64,
}

pub async fn delay(Json(payload): Json<DelayRequest>) -> impl IntoResponse {
    let delayed_ms = payload.delay_ms.min(MAX_DELAY_MS);
    tokio::time::sleep(Duration::from_millis(delayed_ms)).await;
    Json(json!({ "status": "ok", "delayed_ms": delayed_ms }))
}

/// Database round-trip probe. Failure is a finding, not a fault: the
/// response stays 200 with `connected=false` and the error string.
pub async fn connection(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let started = Instant::now();
    let result: std::result::Result<i32, sqlx::Error> =
        sqlx::query_scalar("SELECT 1").fetch_one(&state.pool).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let body = match result {
        Ok(_) => json!({ "connected": true, "latency_ms": latency_ms }),
        Err(e) => json!({ "connected": false, "latency_ms": latency_ms, "error": e.to_string() }),
    };
    Ok(Json(body))
}
