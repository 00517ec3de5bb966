use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub tests_taken: i64,
    pub average_score: f64,
    pub best_score: Option<i32>,
    pub last_activity: Option<DateTime<Utc>>,
    pub by_sub_topic: Vec<SubTopicBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubTopicBreakdown {
    pub sub_topic_id: Uuid,
    pub sub_topic_name: String,
    pub tests_taken: i64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPerformanceRequest {
    pub sub_topic_id: Uuid,
    #[validate(length(min = 1, max = 60))]
    pub test_type: String,
    #[validate(range(min = 0, max = 100))]
    pub score: i32,
    #[validate(range(min = 1))]
    pub total_questions: i32,
    #[validate(range(min = 0))]
    pub correct_answers: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub total_users: i64,
    pub total_questions: i64,
    pub questions_by_sub_topic: Vec<SubTopicCount>,
    pub pending_webhook_events: i64,
    pub performance_rows: i64,
    pub overall_average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubTopicCount {
    pub sub_topic_id: Uuid,
    pub sub_topic_name: String,
    pub question_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementView {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
    pub requirement_kind: String,
    pub requirement_value: i32,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub progress: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementView>,
    pub current_streak: i32,
    pub longest_streak: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnlockRequest {
    pub code: String,
}
