use crate::dto::webhook_dto::CandidateQuestion;
use crate::error::{Error, Result};
use crate::services::webhook_service::WebhookService;
use reqwest::Client;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

/// Thin wrapper around the hosted completion API.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
}

impl CompletionClient {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { client, api_key }
    }

    pub async fn chat(&self, payload: JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Anyhow(anyhow::anyhow!(
                "Completion API error {}: {}",
                status,
                text
            )));
        }

        let body: JsonValue = res.json().await?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| Error::Anyhow(anyhow::anyhow!("Invalid completion response format")))
    }
}

/// Deferred drafting queue. Raw-text webhook events that arrive with a
/// prompt enqueue a job here; the worker drafts structured candidates onto
/// the event for the reviewer. Drafts never publish questions.
#[derive(Clone)]
pub struct GenerationQueueService {
    pool: PgPool,
}

impl GenerationQueueService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, event_id: Uuid, payload: JsonValue) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO generation_jobs (event_id, payload)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(event_id)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;
        let id: Uuid = row.try_get("id")?;
        Ok(id)
    }

    /// Claims and runs at most one pending job. Returns whether a job was
    /// found so the caller can back off when the queue is empty. Failures
    /// mark the job failed; there is no automatic retry.
    pub async fn run_once(
        &self,
        completion: &CompletionClient,
        webhooks: &WebhookService,
    ) -> Result<bool> {
        let rec = sqlx::query(
            r#"
            UPDATE generation_jobs SET status = 'running', started_at = NOW()
            WHERE id = (
                SELECT id FROM generation_jobs WHERE status = 'pending'
                ORDER BY created_at ASC FOR UPDATE SKIP LOCKED LIMIT 1
            )
            RETURNING id, event_id, payload
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = rec else { return Ok(false) };
        let job_id: Uuid = row.try_get("id")?;
        let event_id: Uuid = row.try_get("event_id")?;
        let payload: JsonValue = row.try_get("payload")?;

        match self.draft(&payload, completion).await {
            Ok(drafts) => {
                webhooks
                    .attach_drafts(event_id, &serde_json::to_value(&drafts)?)
                    .await?;
                sqlx::query(
                    r#"
                    UPDATE generation_jobs
                    SET status = 'succeeded', result = $2, finished_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(job_id)
                .bind(serde_json::to_value(&drafts)?)
                .execute(&self.pool)
                .await?;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = ?e, "generation job failed");
                sqlx::query(
                    r#"
                    UPDATE generation_jobs
                    SET status = 'failed', error = $2, finished_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(job_id)
                .bind(e.to_string())
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(true)
    }

    async fn draft(
        &self,
        payload: &JsonValue,
        completion: &CompletionClient,
    ) -> Result<Vec<CandidateQuestion>> {
        let raw_text = payload
            .get("raw_text")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let prompt = payload.get("prompt").and_then(|v| v.as_str()).unwrap_or("");
        let sub_topic_name = payload
            .get("sub_topic_name")
            .and_then(|v| v.as_str())
            .unwrap_or("general reasoning");
        let max = crate::config::get_config().max_generated_questions;

        let system_prompt = r#"You draft cognitive-training question candidates for human review.
The output must be a valid JSON object with a 'questions' array.

Rules:
1. Base every question strictly on the supplied source text.
2. Each question carries: "type" (multiple_choice | text | dual_choice), "question",
   "options" (for choice types), "answer" (the correct option text or value), and
   an optional "explanation".
3. Vary which option is correct; never default to the first.
4. Produce at most the requested number of questions; fewer is fine if the
   text does not support more."#;

        let user_payload = serde_json::json!({
            "sub_topic": sub_topic_name,
            "operator_prompt": prompt,
            "max_questions": max,
            "source_text": raw_text,
        });

        let request = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": serde_json::to_string(&user_payload)?}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7
        });

        let response = completion.chat(request).await?;
        let mut drafts = parse_drafts(&response)?;
        drafts.truncate(max);
        Ok(drafts)
    }
}

/// Parses the model output, failing closed on malformed content: a
/// response that cannot be read as a candidate list produces an error,
/// never a partially stored draft.
fn parse_drafts(response: &JsonValue) -> Result<Vec<CandidateQuestion>> {
    let arr = response
        .get("questions")
        .and_then(|v| v.as_array())
        .or_else(|| response.as_array())
        .ok_or_else(|| Error::BadRequest("completion output lacks a questions array".to_string()))?;

    let mut drafts = Vec::with_capacity(arr.len());
    for value in arr {
        let mut candidate: CandidateQuestion = serde_json::from_value(value.clone())
            .map_err(|e| Error::BadRequest(format!("malformed draft question: {}", e)))?;
        if candidate.question.trim().is_empty() {
            return Err(Error::BadRequest("draft question text is empty".to_string()));
        }
        if candidate.answer.is_none() && candidate.correct_answer.is_none() {
            return Err(Error::BadRequest(
                "draft question lacks an answer".to_string(),
            ));
        }
        if candidate.question_type.is_none() {
            candidate.question_type = Some("multiple_choice".to_string());
        }
        drafts.push(candidate);
    }
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_well_formed_drafts() {
        let response = json!({
            "questions": [
                {"type": "multiple_choice", "question": "2+2?", "options": ["3","4"], "answer": "4"},
                {"question": "Capital of France?", "answer": "Paris"}
            ]
        });
        let drafts = parse_drafts(&response).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].question_type.as_deref(), Some("multiple_choice"));
    }

    #[test]
    fn malformed_output_fails_closed() {
        assert!(parse_drafts(&json!({"nope": true})).is_err());
        assert!(parse_drafts(&json!({"questions": [{"question": ""}]})).is_err());
        assert!(
            parse_drafts(&json!({"questions": [{"question": "No answer provided"}]})).is_err()
        );
    }
}
