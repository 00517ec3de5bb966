use crate::dto::dashboard_dto::{AchievementView, AchievementsResponse};
use crate::error::{Error, Result};
use crate::models::achievement::{Achievement, AchievementStreak, RequirementKind};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Pure streak transition: same-day activity is a no-op, the day after
/// the last activity increments, anything else resets to 1.
pub fn advance_streak(current: i32, last_activity: Option<NaiveDate>, today: NaiveDate) -> i32 {
    match last_activity {
        Some(last) if last == today => current,
        Some(last) if last.succ_opt() == Some(today) => current + 1,
        _ => 1,
    }
}

#[derive(Clone)]
pub struct AchievementService {
    pool: PgPool,
}

impl AchievementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<AchievementsResponse> {
        let streak = self.get_streak(user_id).await?;
        let exams_completed: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM user_performance WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let best_score: Option<i32> =
            sqlx::query_scalar(r#"SELECT MAX(score) FROM user_performance WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            r#"
            SELECT a.id, a.code, a.title, a.description, a.icon,
                   a.requirement_kind, a.requirement_value,
                   ua.unlocked_at
            FROM achievements a
            LEFT JOIN user_achievements ua
              ON ua.achievement_id = a.id AND ua.user_id = $1
            ORDER BY a.requirement_kind, a.requirement_value
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut achievements = Vec::with_capacity(rows.len());
        for row in rows {
            let requirement_kind: String = row.try_get("requirement_kind")?;
            let progress = match RequirementKind::parse(&requirement_kind) {
                Some(RequirementKind::StreakDays) => streak.current_streak,
                Some(RequirementKind::ExamsCompleted) => exams_completed as i32,
                Some(RequirementKind::ScoreReached) => best_score.unwrap_or(0),
                None => 0,
            };
            achievements.push(AchievementView {
                id: row.try_get("id")?,
                code: row.try_get("code")?,
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                icon: row.try_get("icon")?,
                requirement_kind,
                requirement_value: row.try_get("requirement_value")?,
                unlocked_at: row.try_get("unlocked_at")?,
                progress,
            });
        }

        Ok(AchievementsResponse {
            achievements,
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
        })
    }

    /// The streak RPC. Idempotent within a day; newly satisfied streak
    /// achievements are unlocked in the same call.
    pub async fn record_activity(&self, user_id: Uuid) -> Result<AchievementStreak> {
        let today = chrono::Utc::now().date_naive();
        let existing = self.get_streak(user_id).await?;
        let new_current = advance_streak(existing.current_streak, existing.last_activity_date, today);
        let new_longest = existing.longest_streak.max(new_current);

        let streak = sqlx::query_as::<_, AchievementStreak>(
            r#"
            INSERT INTO achievement_streaks (user_id, current_streak, longest_streak, last_activity_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET current_streak = EXCLUDED.current_streak,
                longest_streak = EXCLUDED.longest_streak,
                last_activity_date = EXCLUDED.last_activity_date
            RETURNING user_id, current_streak, longest_streak, last_activity_date
            "#,
        )
        .bind(user_id)
        .bind(new_current)
        .bind(new_longest)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id)
            SELECT $1, id FROM achievements
            WHERE requirement_kind = 'streak_days' AND requirement_value <= $2
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(streak.current_streak)
        .execute(&self.pool)
        .await?;

        Ok(streak)
    }

    /// Explicit unlock by code, idempotent. The caller's progress must
    /// actually satisfy the requirement; this is not a free grant.
    pub async fn unlock(&self, user_id: Uuid, code: &str) -> Result<Achievement> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"
            SELECT id, code, title, description, icon, requirement_kind, requirement_value
            FROM achievements
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Achievement not found".to_string()))?;

        let kind = RequirementKind::parse(&achievement.requirement_kind).ok_or_else(|| {
            Error::Internal(format!(
                "Unknown requirement kind: {}",
                achievement.requirement_kind
            ))
        })?;

        let progress: i32 = match kind {
            RequirementKind::StreakDays => self.get_streak(user_id).await?.current_streak,
            RequirementKind::ExamsCompleted => {
                let count: i64 = sqlx::query_scalar(
                    r#"SELECT COUNT(*) FROM user_performance WHERE user_id = $1"#,
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
                count as i32
            }
            RequirementKind::ScoreReached => {
                let best: Option<i32> = sqlx::query_scalar(
                    r#"SELECT MAX(score) FROM user_performance WHERE user_id = $1"#,
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
                best.unwrap_or(0)
            }
        };

        if progress < achievement.requirement_value {
            return Err(Error::BadRequest(format!(
                "Requirement not met: {}/{}",
                progress, achievement.requirement_value
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(achievement.id)
        .execute(&self.pool)
        .await?;

        Ok(achievement)
    }

    async fn get_streak(&self, user_id: Uuid) -> Result<AchievementStreak> {
        let streak = sqlx::query_as::<_, AchievementStreak>(
            r#"
            SELECT user_id, current_streak, longest_streak, last_activity_date
            FROM achievement_streaks
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(streak.unwrap_or(AchievementStreak {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_day_activity_is_idempotent() {
        let today = date(2026, 8, 25);
        assert_eq!(advance_streak(4, Some(today), today), 4);
    }

    #[test]
    fn next_day_increments() {
        assert_eq!(
            advance_streak(4, Some(date(2026, 8, 24)), date(2026, 8, 25)),
            5
        );
    }

    #[test]
    fn gap_resets_to_one() {
        assert_eq!(
            advance_streak(9, Some(date(2026, 8, 20)), date(2026, 8, 25)),
            1
        );
    }

    #[test]
    fn first_activity_starts_at_one() {
        assert_eq!(advance_streak(0, None, date(2026, 8, 25)), 1);
    }

    #[test]
    fn increment_works_across_month_boundary() {
        assert_eq!(
            advance_streak(2, Some(date(2026, 7, 31)), date(2026, 8, 1)),
            3
        );
    }
}
