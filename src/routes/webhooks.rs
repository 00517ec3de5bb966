use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::dto::webhook_dto::{
    ApproveEventRequest, ApproveEventResponse, BatchAccepted, CreateKeyRequest, CreateKeyResponse,
    IngestRequest, ListEventsQuery, RawTextAccepted,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthContext;
use crate::services::webhook_service::extract_key;
use crate::AppState;

/// The ingestion gate. Authenticates the presented key, then stores the
/// payload as one unprocessed event; content is never auto-published.
pub async fn ingest_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<IngestRequest>,
) -> Result<Response> {
    let Some(key) = extract_key(&headers) else {
        return Err(Error::Unauthorized("missing_webhook_key".to_string()));
    };
    let identity = state.webhook_service.verify_key(&key).await?;

    if let Some(questions) = &payload.questions {
        let (_, question_count) = state
            .webhook_service
            .record_question_batch(
                &identity,
                payload.sub_topic_id,
                payload.sub_topic_name.as_deref(),
                questions,
            )
            .await?;
        return Ok(Json(BatchAccepted {
            success: true,
            question_count,
        })
        .into_response());
    }

    let Some(raw_text) = payload.raw_text.as_deref() else {
        return Err(Error::BadRequest(
            "either raw_text or questions is required".to_string(),
        ));
    };
    let event_id = state
        .webhook_service
        .record_raw_text(
            &identity,
            payload.sub_topic_id,
            payload.sub_topic_name.as_deref(),
            payload.prompt.as_deref(),
            raw_text,
        )
        .await?;

    // A prompt alongside raw text asks for completion-API drafts; the
    // reviewer still decides what gets published.
    if let Some(prompt) = payload.prompt.as_deref() {
        let job_payload = json!({
            "raw_text": raw_text,
            "prompt": prompt,
            "sub_topic_name": payload.sub_topic_name,
        });
        if let Err(e) = state.generation_queue.enqueue(event_id, job_payload).await {
            tracing::error!(event_id = %event_id, error = ?e, "failed to enqueue generation job");
        }
    }

    Ok(Json(RawTextAccepted { event_id }).into_response())
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse> {
    let events = state
        .webhook_service
        .list_events(
            query.processed,
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(20),
        )
        .await?;
    Ok(Json(events))
}

/// `{pending}` for the operator UI's interval polling.
pub async fn pending_count(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let pending = state.webhook_service.pending_count().await?;
    Ok(Json(json!({ "pending": pending })))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let event = state.webhook_service.get_event(id).await?;
    Ok(Json(event))
}

pub async fn approve_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<ApproveEventRequest>,
) -> Result<impl IntoResponse> {
    let question_count = state
        .webhook_service
        .approve_event(id, &payload.questions, ctx.user_id)
        .await?;
    Ok(Json(ApproveEventResponse {
        event_id: id,
        question_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/keys",
    request_body = inline(String),
    responses(
        (status = 201, description = "Key created; plaintext returned once"),
        (status = 409, description = "Source already has a key")
    )
)]
pub async fn create_key(
    State(state): State<AppState>,
    Json(payload): Json<CreateKeyRequest>,
) -> Result<impl IntoResponse> {
    let (key, plaintext) = state.webhook_service.create_key(&payload.source).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateKeyResponse {
            id: key.id,
            source: key.source,
            key: plaintext,
        }),
    ))
}

pub async fn list_keys(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let keys = state.webhook_service.list_keys().await?;
    Ok(Json(keys))
}

pub async fn deactivate_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.webhook_service.deactivate_key(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
