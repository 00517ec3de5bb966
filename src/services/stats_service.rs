use crate::dto::dashboard_dto::{
    AdminOverview, DashboardSummary, RecordPerformanceRequest, SubTopicBreakdown, SubTopicCount,
};
use crate::error::{Error, Result};
use crate::models::performance::UserPerformance;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct StatsService {
    pool: PgPool,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The recording RPC. The 0..=100 invariant is validated at the DTO
    /// edge and enforced again by the table CHECK.
    pub async fn record_performance(
        &self,
        user_id: Uuid,
        payload: &RecordPerformanceRequest,
    ) -> Result<UserPerformance> {
        if payload.correct_answers > payload.total_questions {
            return Err(Error::BadRequest(
                "correct_answers cannot exceed total_questions".to_string(),
            ));
        }
        let row = sqlx::query_as::<_, UserPerformance>(
            r#"
            INSERT INTO user_performance
                (user_id, sub_topic_id, test_type, score, total_questions, correct_answers)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, sub_topic_id, test_type, score,
                      total_questions, correct_answers, taken_at
            "#,
        )
        .bind(user_id)
        .bind(payload.sub_topic_id)
        .bind(&payload.test_type)
        .bind(payload.score)
        .bind(payload.total_questions)
        .bind(payload.correct_answers)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn user_summary(&self, user_id: Uuid) -> Result<DashboardSummary> {
        let totals = sqlx::query(
            r#"
            SELECT COUNT(*) AS tests_taken,
                   AVG(score) AS average_score,
                   MAX(score) AS best_score,
                   MAX(taken_at) AS last_activity
            FROM user_performance
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let tests_taken: i64 = totals.try_get("tests_taken")?;
        let average_score = decimal_to_f64(totals.try_get("average_score")?);
        let best_score: Option<i32> = totals.try_get("best_score")?;
        let last_activity: Option<chrono::DateTime<chrono::Utc>> =
            totals.try_get("last_activity")?;

        let rows = sqlx::query(
            r#"
            SELECT p.sub_topic_id,
                   st.name AS sub_topic_name,
                   COUNT(*) AS tests_taken,
                   AVG(p.score) AS average_score
            FROM user_performance p
            JOIN sub_topics st ON st.id = p.sub_topic_id
            WHERE p.user_id = $1
            GROUP BY p.sub_topic_id, st.name
            ORDER BY st.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sub_topic = Vec::with_capacity(rows.len());
        for row in rows {
            by_sub_topic.push(SubTopicBreakdown {
                sub_topic_id: row.try_get("sub_topic_id")?,
                sub_topic_name: row.try_get("sub_topic_name")?,
                tests_taken: row.try_get("tests_taken")?,
                average_score: decimal_to_f64(row.try_get("average_score")?),
            });
        }

        Ok(DashboardSummary {
            tests_taken,
            average_score,
            best_score,
            last_activity,
            by_sub_topic,
        })
    }

    pub async fn admin_overview(&self) -> Result<AdminOverview> {
        let total_users: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM profiles"#)
            .fetch_one(&self.pool)
            .await?;
        let total_questions: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM questions"#)
            .fetch_one(&self.pool)
            .await?;
        let pending_webhook_events: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM webhook_events WHERE processed = FALSE"#)
                .fetch_one(&self.pool)
                .await?;

        let perf = sqlx::query(
            r#"SELECT COUNT(*) AS rows, AVG(score) AS average FROM user_performance"#,
        )
        .fetch_one(&self.pool)
        .await?;
        let performance_rows: i64 = perf.try_get("rows")?;
        let overall_average_score = decimal_to_f64(perf.try_get("average")?);

        let rows = sqlx::query(
            r#"
            SELECT st.id AS sub_topic_id, st.name AS sub_topic_name, COUNT(q.id) AS question_count
            FROM sub_topics st
            LEFT JOIN questions q ON q.sub_topic_id = st.id
            GROUP BY st.id, st.name
            ORDER BY st.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut questions_by_sub_topic = Vec::with_capacity(rows.len());
        for row in rows {
            questions_by_sub_topic.push(SubTopicCount {
                sub_topic_id: row.try_get("sub_topic_id")?,
                sub_topic_name: row.try_get("sub_topic_name")?,
                question_count: row.try_get("question_count")?,
            });
        }

        Ok(AdminOverview {
            total_users,
            total_questions,
            questions_by_sub_topic,
            pending_webhook_events,
            performance_rows,
            overall_average_score,
        })
    }

    pub async fn all_performance_rows(&self) -> Result<Vec<PerformanceExportRow>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, pr.email, st.name AS sub_topic_name, p.test_type,
                   p.score, p.total_questions, p.correct_answers, p.taken_at
            FROM user_performance p
            JOIN profiles pr ON pr.id = p.user_id
            JOIN sub_topics st ON st.id = p.sub_topic_id
            ORDER BY p.taken_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(PerformanceExportRow {
                email: row.try_get("email")?,
                sub_topic_name: row.try_get("sub_topic_name")?,
                test_type: row.try_get("test_type")?,
                score: row.try_get("score")?,
                total_questions: row.try_get("total_questions")?,
                correct_answers: row.try_get("correct_answers")?,
                taken_at: row.try_get("taken_at")?,
            });
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceExportRow {
    pub email: String,
    pub sub_topic_name: String,
    pub test_type: String,
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub taken_at: chrono::DateTime<chrono::Utc>,
}

/// Postgres returns AVG over integers as numeric; read it back through
/// Decimal and degrade to 0.0 when there are no rows.
fn decimal_to_f64(value: Option<Decimal>) -> f64 {
    value.and_then(|d| d.to_f64()).unwrap_or(0.0)
}
