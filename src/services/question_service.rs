use crate::error::{Error, Result};
use crate::exam::SessionQuestion;
use crate::models::question::{Question, QuestionContent, QuestionType};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedQuestions {
    pub items: Vec<Question>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a question with a normalized canonical answer. Content is
    /// immutable afterwards; there is deliberately no update method.
    pub async fn create(
        &self,
        sub_topic_id: Uuid,
        question_type: &str,
        content: JsonValue,
        source: &str,
        created_by: Option<Uuid>,
    ) -> Result<Question> {
        let qtype = QuestionType::parse(question_type)
            .ok_or_else(|| Error::BadRequest(format!("Unknown question type: {}", question_type)))?;

        let mut parsed: QuestionContent = serde_json::from_value(content)?;
        if parsed.question.trim().is_empty() {
            return Err(Error::BadRequest("Question text is required".to_string()));
        }
        parsed.normalize();
        if parsed.canonical_answer().is_none() {
            return Err(Error::BadRequest(
                "Question content must carry a correct answer".to_string(),
            ));
        }
        let stored = serde_json::to_value(&parsed)?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (sub_topic_id, question_type, content, source, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sub_topic_id, question_type, content, source,
                      is_active, created_by, created_at, updated_at
            "#,
        )
        .bind(sub_topic_id)
        .bind(qtype.as_str())
        .bind(&stored)
        .bind(source)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn get(&self, id: Uuid) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, sub_topic_id, question_type, content, source,
                   is_active, created_by, created_at, updated_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    pub async fn list(
        &self,
        sub_topic_id: Option<Uuid>,
        page: i64,
        per_page: i64,
    ) -> Result<PaginatedQuestions> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM questions WHERE ($1::uuid IS NULL OR sub_topic_id = $1)"#,
        )
        .bind(sub_topic_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, sub_topic_id, question_type, content, source,
                   is_active, created_by, created_at, updated_at
            FROM questions
            WHERE ($1::uuid IS NULL OR sub_topic_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(sub_topic_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedQuestions {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM questions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    /// Hides a question from new sessions without touching its content.
    pub async fn deactivate(&self, id: Uuid) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, sub_topic_id, question_type, content, source,
                      is_active, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    /// Active questions for a sub-topic, snapshotted for a new exam
    /// session. Rows whose content fails to parse are skipped rather than
    /// failing the whole exam.
    pub async fn load_for_exam(
        &self,
        sub_topic_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionQuestion>> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, sub_topic_id, question_type, content, source,
                   is_active, created_by, created_at, updated_at
            FROM questions
            WHERE sub_topic_id = $1 AND is_active = TRUE
            ORDER BY random()
            LIMIT $2
            "#,
        )
        .bind(sub_topic_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshot = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_value::<QuestionContent>(row.content.clone()) {
                Ok(content) => snapshot.push(SessionQuestion {
                    id: row.id,
                    question_type: row.question_type,
                    content,
                }),
                Err(e) => {
                    tracing::warn!(question_id = %row.id, error = %e, "skipping malformed question content");
                }
            }
        }
        Ok(snapshot)
    }
}
