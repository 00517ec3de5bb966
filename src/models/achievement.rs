use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
    pub requirement_kind: String,
    pub requirement_value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    StreakDays,
    ExamsCompleted,
    ScoreReached,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::StreakDays => "streak_days",
            RequirementKind::ExamsCompleted => "exams_completed",
            RequirementKind::ScoreReached => "score_reached",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "streak_days" => Some(RequirementKind::StreakDays),
            "exams_completed" => Some(RequirementKind::ExamsCompleted),
            "score_reached" => Some(RequirementKind::ScoreReached),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AchievementStreak {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
}
