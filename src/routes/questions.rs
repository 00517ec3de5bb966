use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::content_dto::{CreateQuestionRequest, ListQuestionsQuery};
use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::models::profile::Role;
use crate::AppState;

/// Question creation is reviewer-gated (admin or data-input); the stored
/// source records which kind of actor created it.
pub async fn create_question(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let source = match ctx.role {
        Role::Admin => "admin",
        _ => "data_input",
    };
    let question = state
        .question_service
        .create(
            payload.sub_topic_id,
            &payload.question_type,
            payload.content,
            source,
            Some(ctx.user_id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<impl IntoResponse> {
    let questions = state
        .question_service
        .list(
            query.sub_topic_id,
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(20),
        )
        .await?;
    Ok(Json(questions))
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.question_service.get(id).await?))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.question_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.question_service.deactivate(id).await?))
}
