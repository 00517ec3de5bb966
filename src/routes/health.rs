use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness only; database reachability lives under /api/diagnostics.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
