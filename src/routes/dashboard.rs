use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::dto::dashboard_dto::RecordPerformanceRequest;
use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::services::report_service::ReportService;
use crate::AppState;

pub async fn user_summary(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let summary = state.stats_service.user_summary(ctx.user_id).await?;
    Ok(Json(summary))
}

pub async fn record_performance(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<RecordPerformanceRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let row = state
        .stats_service
        .record_performance(ctx.user_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/overview",
    responses((status = 200, description = "Site-wide totals for the admin dashboard"))
)]
pub async fn admin_overview(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let overview = state.stats_service.admin_overview().await?;
    Ok(Json(overview))
}

pub async fn export_performance(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rows = state.stats_service.all_performance_rows().await?;
    let buffer = ReportService::performance_xlsx(&rows)?;
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"performance.xlsx\"".to_string(),
            ),
        ],
        buffer,
    ))
}
