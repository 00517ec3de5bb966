use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::content_dto::{
    CreateDifferentiatorRequest, CreateSectionRequest, CreateStatsCardRequest,
    CreateSubTopicRequest, UpdateDifferentiatorRequest, UpdateSectionRequest,
    UpdateStatsCardRequest, UpdateSubTopicRequest,
};
use crate::error::{Error, Result};
use crate::AppState;

const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

// ── public reads ──

pub async fn public_stats_cards(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.content_service.list_stats_cards(false).await?))
}

pub async fn public_sections(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.content_service.list_sections(false).await?))
}

pub async fn public_differentiators(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.content_service.list_differentiators(false).await?))
}

pub async fn list_sub_topics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.content_service.list_sub_topics(None).await?))
}

// ── admin CRUD ──

#[utoipa::path(
    post,
    path = "/api/admin/stats-cards",
    responses((status = 201, description = "Stats card created"))
)]
pub async fn create_stats_card(
    State(state): State<AppState>,
    Json(payload): Json<CreateStatsCardRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let card = state.content_service.create_stats_card(&payload).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_stats_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatsCardRequest>,
) -> Result<impl IntoResponse> {
    let card = state.content_service.update_stats_card(id, &payload).await?;
    Ok(Json(card))
}

pub async fn delete_stats_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.content_service.delete_stats_card(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_section(
    State(state): State<AppState>,
    Json(payload): Json<CreateSectionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let section = state.content_service.create_section(&payload).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSectionRequest>,
) -> Result<impl IntoResponse> {
    let section = state.content_service.update_section(id, &payload).await?;
    Ok(Json(section))
}

pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.content_service.delete_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_sub_topic(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubTopicRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let sub_topic = state.content_service.create_sub_topic(&payload).await?;
    Ok((StatusCode::CREATED, Json(sub_topic)))
}

pub async fn update_sub_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubTopicRequest>,
) -> Result<impl IntoResponse> {
    let sub_topic = state.content_service.update_sub_topic(id, &payload).await?;
    Ok(Json(sub_topic))
}

pub async fn delete_sub_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.content_service.delete_sub_topic(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_differentiator(
    State(state): State<AppState>,
    Json(payload): Json<CreateDifferentiatorRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let row = state.content_service.create_differentiator(&payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_differentiator(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDifferentiatorRequest>,
) -> Result<impl IntoResponse> {
    let row = state
        .content_service
        .update_differentiator(id, &payload)
        .await?;
    Ok(Json(row))
}

pub async fn delete_differentiator(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.content_service.delete_differentiator(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── media upload ──

/// Saves one image under the uploads dir and returns its public path.
pub async fn upload_media(mut multipart: Multipart) -> Result<impl IntoResponse> {
    let field = multipart
        .next_field()
        .await?
        .ok_or_else(|| Error::BadRequest("file field is required".to_string()))?;

    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::BadRequest("file name is required".to_string()))?;
    let extension = file_name
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::BadRequest(format!(
            "unsupported file type: .{}",
            extension
        )));
    }

    let data = field.bytes().await?;
    if data.is_empty() {
        return Err(Error::BadRequest("file is empty".to_string()));
    }

    let uploads_dir = crate::config::get_config().uploads_dir.clone();
    tokio::fs::create_dir_all(&uploads_dir).await?;
    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    tokio::fs::write(format!("{}/{}", uploads_dir, stored_name), &data).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "path": format!("/uploads/{}", stored_name) })),
    ))
}
