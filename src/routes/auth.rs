use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use validator::Validate;

use crate::dto::auth_dto::{GateResponse, LoginRequest, RegisterRequest};
use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.auth_service.login(payload).await?;
    Ok(Json(response))
}

/// Materializes the routing decision for the caller's identity: exactly
/// one role branch, admin-first when flags overlap.
pub async fn gate(Extension(ctx): Extension<AuthContext>) -> Result<impl IntoResponse> {
    Ok(Json(GateResponse {
        role: ctx.role,
        landing: ctx.role.landing(),
    }))
}
