use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::exam_dto::{
    PositionRequest, PublicQuestion, ReviewQuestion, ReviewResponse, SelectAnswerRequest,
    SelectAnswerResponse, StartExamRequest, StartExamResponse, SubmitExamResponse,
};
use crate::error::{Error, Result};
use crate::exam::session::SubmitOutcome;
use crate::middleware::auth::maybe_identity;
use crate::AppState;

const DEFAULT_QUESTION_LIMIT: i64 = 20;

/// Starts a practice/exam session over a sub-topic. Works anonymously;
/// an authenticated caller's id is attached as the session owner.
pub async fn start_exam(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StartExamRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let limit = payload.limit.unwrap_or(DEFAULT_QUESTION_LIMIT);
    let questions = state
        .question_service
        .load_for_exam(payload.sub_topic_id, limit)
        .await?;
    if questions.is_empty() {
        return Err(Error::NotFound(
            "No active questions for this sub-topic".to_string(),
        ));
    }

    let user_id = maybe_identity(&headers).map(|ctx| ctx.user_id);
    let session = state
        .sessions
        .create(user_id, payload.sub_topic_id, questions);

    let public_questions: Vec<PublicQuestion> = session
        .questions
        .iter()
        .map(|q| PublicQuestion {
            id: q.id,
            question_type: q.question_type.clone(),
            content: q.content.sanitized(),
        })
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(StartExamResponse {
            session_id: session.id,
            sub_topic_id: session.sub_topic_id,
            total_questions: public_questions.len(),
            questions: public_questions,
        }),
    ))
}

pub async fn select_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse> {
    let saved = state
        .sessions
        .select_answer(id, payload.question_id, payload.answer)?;
    Ok(Json(SelectAnswerResponse {
        saved,
        question_id: payload.question_id,
    }))
}

pub async fn goto_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PositionRequest>,
) -> Result<impl IntoResponse> {
    let index = state.sessions.goto(id, payload.index)?;
    Ok(Json(json!({ "current_index": index })))
}

/// Finalizes the session. Zero recorded answers is a soft failure: 422
/// with a warning, state untouched, never a score. The computed result is
/// returned to the caller only, never persisted.
pub async fn submit_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    match state.sessions.submit(id)? {
        SubmitOutcome::NoAnswers => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "warning": "No answers were recorded; the exam was not submitted"
            })),
        )
            .into_response()),
        SubmitOutcome::Scored(breakdown) => Ok(Json(SubmitExamResponse {
            session_id: id,
            score: breakdown.score,
            correct: breakdown.correct,
            total: breakdown.total,
            results: breakdown.results,
        })
        .into_response()),
    }
}

/// Post-completion inspection: the full snapshot with canonical answers
/// and explanations, plus what the caller submitted.
pub async fn review_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state.sessions.review(id)?;
    let questions = session
        .questions
        .iter()
        .map(|q| ReviewQuestion {
            id: q.id,
            question_type: q.question_type.clone(),
            content: q.content.clone(),
            submitted: session.answers.get(&q.id).cloned(),
        })
        .collect();
    Ok(Json(ReviewResponse {
        session_id: session.id,
        review_mode: session.review_mode,
        questions,
    }))
}

pub async fn abandon_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.sessions.abandon(id)?;
    Ok(StatusCode::NO_CONTENT)
}
