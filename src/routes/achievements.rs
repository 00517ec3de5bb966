use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::dto::dashboard_dto::UnlockRequest;
use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::AppState;

pub async fn list_achievements(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let response = state
        .achievement_service
        .list_for_user(ctx.user_id)
        .await?;
    Ok(Json(response))
}

/// The streak RPC: same-day idempotent, next-day increments, gap resets.
pub async fn record_activity(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let streak = state
        .achievement_service
        .record_activity(ctx.user_id)
        .await?;
    Ok(Json(streak))
}

pub async fn unlock_achievement(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<UnlockRequest>,
) -> Result<impl IntoResponse> {
    let achievement = state
        .achievement_service
        .unlock(ctx.user_id, &payload.code)
        .await?;
    Ok(Json(achievement))
}
