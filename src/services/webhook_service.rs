use crate::dto::webhook_dto::CandidateQuestion;
use crate::error::{Error, Result};
use crate::models::question::QuestionContent;
use crate::models::webhook::{WebhookEvent, WebhookKey};
use crate::utils::crypto::sha256_hex;
use crate::utils::markdown::strip_heading_markers;
use crate::utils::token::generate_webhook_key;
use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Which credential authenticated the request: the configured master key,
/// or a registered per-source key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyIdentity {
    Master,
    Registered { id: Uuid, source: String },
}

impl KeyIdentity {
    pub fn source_label(&self) -> &str {
        match self {
            KeyIdentity::Master => "master",
            KeyIdentity::Registered { source, .. } => source,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PaginatedEvents {
    pub items: Vec<WebhookEvent>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Resolution order: the custom header wins, then the standard
/// Authorization header, which may carry either `Bearer <key>` or the raw
/// value.
pub fn extract_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-webhook-key") {
        return value.to_str().ok().map(|s| s.to_string());
    }
    let auth = headers.get(axum::http::header::AUTHORIZATION)?;
    let raw = auth.to_str().ok()?;
    Some(raw.strip_prefix("Bearer ").unwrap_or(raw).to_string())
}

#[derive(Clone)]
pub struct WebhookService {
    pool: PgPool,
}

impl WebhookService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Constant-time match against the master key first, then a digest
    /// lookup over the registered keys. On a registered hit the
    /// last-used timestamp is updated best-effort; a failure there is
    /// logged but never fails the request.
    pub async fn verify_key(&self, presented: &str) -> Result<KeyIdentity> {
        let master = &crate::config::get_config().webhook_master_key;
        if !master.is_empty()
            && bool::from(ConstantTimeEq::ct_eq(
                presented.as_bytes(),
                master.as_bytes(),
            ))
        {
            return Ok(KeyIdentity::Master);
        }

        let digest = sha256_hex(presented);
        let key = sqlx::query_as::<_, WebhookKey>(
            r#"
            SELECT id, source, key_hash, is_active, last_used_at, created_at
            FROM webhook_keys
            WHERE key_hash = $1 AND is_active = TRUE
            "#,
        )
        .bind(&digest)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid_webhook_key".to_string()))?;

        if let Err(e) = sqlx::query(r#"UPDATE webhook_keys SET last_used_at = NOW() WHERE id = $1"#)
            .bind(key.id)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(key_id = %key.id, error = %e, "failed to update webhook key last_used_at");
        }

        Ok(KeyIdentity::Registered {
            id: key.id,
            source: key.source,
        })
    }

    /// Stores a raw-text payload as one unprocessed event. Heading markers
    /// are stripped; nothing else is parsed at ingestion.
    pub async fn record_raw_text(
        &self,
        identity: &KeyIdentity,
        sub_topic_id: Uuid,
        sub_topic_name: Option<&str>,
        prompt: Option<&str>,
        raw_text: &str,
    ) -> Result<Uuid> {
        let cleaned = strip_heading_markers(raw_text);
        let payload = json!({
            "sub_topic_id": sub_topic_id,
            "sub_topic_name": sub_topic_name,
            "prompt": prompt,
            "raw_text": cleaned,
        });
        self.insert_event(identity.source_label(), "raw_text", &payload)
            .await
    }

    /// Validates and stores a structured candidate batch as one event.
    /// Malformed candidates fail the whole request closed; nothing is
    /// stored. Candidate answers are normalized into the canonical field.
    pub async fn record_question_batch(
        &self,
        identity: &KeyIdentity,
        sub_topic_id: Uuid,
        sub_topic_name: Option<&str>,
        candidates: &[CandidateQuestion],
    ) -> Result<(Uuid, usize)> {
        if candidates.is_empty() {
            return Err(Error::BadRequest(
                "questions must not be empty".to_string(),
            ));
        }
        let mut validated = Vec::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            validated.push(
                validate_candidate(candidate)
                    .map_err(|e| Error::BadRequest(format!("question {}: {}", i + 1, e)))?,
            );
        }

        let payload = json!({
            "sub_topic_id": sub_topic_id,
            "sub_topic_name": sub_topic_name,
            "questions": validated,
        });
        let event_id = self
            .insert_event(identity.source_label(), "question_batch", &payload)
            .await?;
        Ok((event_id, validated.len()))
    }

    async fn insert_event(
        &self,
        source: &str,
        event_type: &str,
        payload: &JsonValue,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO webhook_events (source, event_type, payload)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(source)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list_events(
        &self,
        processed: Option<bool>,
        page: i64,
        per_page: i64,
    ) -> Result<PaginatedEvents> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM webhook_events WHERE ($1::bool IS NULL OR processed = $1)"#,
        )
        .bind(processed)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, WebhookEvent>(
            r#"
            SELECT id, source, event_type, payload, processed, processed_at, created_at, updated_at
            FROM webhook_events
            WHERE ($1::bool IS NULL OR processed = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(processed)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedEvents {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    pub async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM webhook_events WHERE processed = FALSE"#)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<WebhookEvent> {
        let event = sqlx::query_as::<_, WebhookEvent>(
            r#"
            SELECT id, source, event_type, payload, processed, processed_at, created_at, updated_at
            FROM webhook_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    /// Operator approval: inserts the reviewed batch as real questions and
    /// flips `processed` in one transaction. This is the only multi-step
    /// write in the webhook path.
    pub async fn approve_event(
        &self,
        event_id: Uuid,
        questions: &[CandidateQuestion],
        reviewer: Uuid,
    ) -> Result<usize> {
        if questions.is_empty() {
            return Err(Error::BadRequest(
                "approval requires at least one question".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, WebhookEvent>(
            r#"
            SELECT id, source, event_type, payload, processed, processed_at, created_at, updated_at
            FROM webhook_events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        if event.processed {
            return Err(Error::Conflict(
                "Event has already been processed".to_string(),
            ));
        }

        let sub_topic_id = event
            .payload
            .get("sub_topic_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| Error::BadRequest("event payload lacks sub_topic_id".to_string()))?;

        let mut inserted = 0usize;
        for (i, candidate) in questions.iter().enumerate() {
            let validated = validate_candidate(candidate)
                .map_err(|e| Error::BadRequest(format!("question {}: {}", i + 1, e)))?;
            let qtype = candidate
                .question_type
                .as_deref()
                .unwrap_or("multiple_choice");
            sqlx::query(
                r#"
                INSERT INTO questions (sub_topic_id, question_type, content, source, created_by)
                VALUES ($1, $2, $3, 'webhook', $4)
                "#,
            )
            .bind(sub_topic_id)
            .bind(qtype)
            .bind(&validated)
            .bind(reviewer)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        sqlx::query(
            r#"
            UPDATE webhook_events
            SET processed = TRUE, processed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    /// Attaches completion-API drafts to an unprocessed event for the
    /// reviewer. Drafts never publish questions by themselves.
    pub async fn attach_drafts(&self, event_id: Uuid, drafts: &JsonValue) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE webhook_events
            SET payload = jsonb_set(payload, '{draft_questions}', $2, TRUE),
                updated_at = NOW()
            WHERE id = $1 AND processed = FALSE
            "#,
        )
        .bind(event_id)
        .bind(drafts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create_key(&self, source: &str) -> Result<(WebhookKey, String)> {
        if source.trim().is_empty() {
            return Err(Error::BadRequest("source is required".to_string()));
        }
        let plaintext = generate_webhook_key(40);
        let key = sqlx::query_as::<_, WebhookKey>(
            r#"
            INSERT INTO webhook_keys (source, key_hash)
            VALUES ($1, $2)
            RETURNING id, source, key_hash, is_active, last_used_at, created_at
            "#,
        )
        .bind(source.trim())
        .bind(sha256_hex(&plaintext))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("A key for this source already exists".to_string())
            }
            _ => e.into(),
        })?;
        Ok((key, plaintext))
    }

    pub async fn list_keys(&self) -> Result<Vec<WebhookKey>> {
        let keys = sqlx::query_as::<_, WebhookKey>(
            r#"
            SELECT id, source, key_hash, is_active, last_used_at, created_at
            FROM webhook_keys
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    pub async fn deactivate_key(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query(r#"UPDATE webhook_keys SET is_active = FALSE WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Webhook key not found".to_string()));
        }
        Ok(())
    }
}

/// Shape check for one candidate: question text plus a canonical answer
/// are mandatory; image candidates carrying a base64 data URL are decoded
/// for integrity and size. Returns the normalized content object.
fn validate_candidate(candidate: &CandidateQuestion) -> std::result::Result<JsonValue, String> {
    if candidate.question.trim().is_empty() {
        return Err("question text is required".to_string());
    }
    if let Some(t) = candidate.question_type.as_deref() {
        if crate::models::question::QuestionType::parse(t).is_none() {
            return Err(format!("unknown question type: {}", t));
        }
    }

    let mut content = QuestionContent {
        question: candidate.question.trim().to_string(),
        options: candidate.options.clone(),
        answer: candidate.answer.clone(),
        correct_answer: candidate.correct_answer.clone(),
        explanation: candidate.explanation.clone(),
        media_url: None,
    };
    content.normalize();
    if content.canonical_answer().is_none() {
        return Err("a correct answer is required".to_string());
    }

    if let Some(data_url) = candidate.image_data.as_deref() {
        let encoded = data_url
            .split_once("base64,")
            .map(|(_, rest)| rest)
            .unwrap_or(data_url);
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| "image_data is not valid base64".to_string())?;
        if bytes.is_empty() {
            return Err("image_data is empty".to_string());
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err("image_data exceeds the 5 MiB limit".to_string());
        }
    }

    let mut stored = serde_json::to_value(&content).map_err(|e| e.to_string())?;
    if let Some(data_url) = &candidate.image_data {
        stored["image_data"] = JsonValue::String(data_url.clone());
    }
    Ok(stored)
}
