use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One recorded test result. Scores are integer percentages in [0,100],
/// enforced both at the API edge and by a table CHECK.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPerformance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sub_topic_id: Uuid,
    pub test_type: String,
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub taken_at: DateTime<Utc>,
}
