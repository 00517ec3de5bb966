use crate::dto::content_dto::{
    CreateDifferentiatorRequest, CreateSectionRequest, CreateStatsCardRequest,
    CreateSubTopicRequest, UpdateDifferentiatorRequest, UpdateSectionRequest,
    UpdateStatsCardRequest, UpdateSubTopicRequest,
};
use crate::error::{Error, Result};
use crate::models::content::{Differentiator, Icon, Section, StatsCard, SubTopic};
use sqlx::PgPool;
use uuid::Uuid;

/// CRUD over the public-site configuration tables. Partial updates use
/// COALESCE so absent fields keep their stored values.
#[derive(Clone)]
pub struct ContentService {
    pool: PgPool,
}

impl ContentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn require_icon(raw: &str) -> Result<&str> {
        Icon::parse(raw)
            .map(|_| raw)
            .ok_or_else(|| Error::BadRequest(format!("Unknown icon: {}", raw)))
    }

    // ── stats cards ──

    pub async fn list_stats_cards(&self, include_inactive: bool) -> Result<Vec<StatsCard>> {
        let cards = sqlx::query_as::<_, StatsCard>(
            r#"
            SELECT id, label, value, icon, display_order, is_active, created_at, updated_at
            FROM stats_cards
            WHERE ($1 OR is_active = TRUE)
            ORDER BY display_order, created_at
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(cards)
    }

    pub async fn create_stats_card(&self, payload: &CreateStatsCardRequest) -> Result<StatsCard> {
        Self::require_icon(&payload.icon)?;
        let card = sqlx::query_as::<_, StatsCard>(
            r#"
            INSERT INTO stats_cards (label, value, icon, display_order)
            VALUES ($1, $2, $3, COALESCE($4, 0))
            RETURNING id, label, value, icon, display_order, is_active, created_at, updated_at
            "#,
        )
        .bind(&payload.label)
        .bind(&payload.value)
        .bind(&payload.icon)
        .bind(payload.display_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(card)
    }

    pub async fn update_stats_card(
        &self,
        id: Uuid,
        payload: &UpdateStatsCardRequest,
    ) -> Result<StatsCard> {
        if let Some(icon) = &payload.icon {
            Self::require_icon(icon)?;
        }
        let card = sqlx::query_as::<_, StatsCard>(
            r#"
            UPDATE stats_cards
            SET label = COALESCE($2, label),
                value = COALESCE($3, value),
                icon = COALESCE($4, icon),
                display_order = COALESCE($5, display_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, label, value, icon, display_order, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.label)
        .bind(&payload.value)
        .bind(&payload.icon)
        .bind(payload.display_order)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(card)
    }

    pub async fn delete_stats_card(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM stats_cards WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Stats card not found".to_string()));
        }
        Ok(())
    }

    // ── sections ──

    pub async fn list_sections(&self, include_inactive: bool) -> Result<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(
            r#"
            SELECT id, title, description, display_order, is_active, created_at, updated_at
            FROM sections
            WHERE ($1 OR is_active = TRUE)
            ORDER BY display_order, created_at
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    pub async fn create_section(&self, payload: &CreateSectionRequest) -> Result<Section> {
        let section = sqlx::query_as::<_, Section>(
            r#"
            INSERT INTO sections (title, description, display_order)
            VALUES ($1, $2, COALESCE($3, 0))
            RETURNING id, title, description, display_order, is_active, created_at, updated_at
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.display_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(section)
    }

    pub async fn update_section(
        &self,
        id: Uuid,
        payload: &UpdateSectionRequest,
    ) -> Result<Section> {
        let section = sqlx::query_as::<_, Section>(
            r#"
            UPDATE sections
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                display_order = COALESCE($4, display_order),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, display_order, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.display_order)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(section)
    }

    pub async fn delete_section(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM sections WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Section not found".to_string()));
        }
        Ok(())
    }

    // ── sub-topics ──

    pub async fn list_sub_topics(&self, section_id: Option<Uuid>) -> Result<Vec<SubTopic>> {
        let sub_topics = sqlx::query_as::<_, SubTopic>(
            r#"
            SELECT id, section_id, name, display_order, created_at
            FROM sub_topics
            WHERE ($1::uuid IS NULL OR section_id = $1)
            ORDER BY display_order, name
            "#,
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sub_topics)
    }

    pub async fn create_sub_topic(&self, payload: &CreateSubTopicRequest) -> Result<SubTopic> {
        let sub_topic = sqlx::query_as::<_, SubTopic>(
            r#"
            INSERT INTO sub_topics (section_id, name, display_order)
            VALUES ($1, $2, COALESCE($3, 0))
            RETURNING id, section_id, name, display_order, created_at
            "#,
        )
        .bind(payload.section_id)
        .bind(&payload.name)
        .bind(payload.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Error::BadRequest("Section does not exist".to_string())
            }
            _ => e.into(),
        })?;
        Ok(sub_topic)
    }

    pub async fn update_sub_topic(
        &self,
        id: Uuid,
        payload: &UpdateSubTopicRequest,
    ) -> Result<SubTopic> {
        let sub_topic = sqlx::query_as::<_, SubTopic>(
            r#"
            UPDATE sub_topics
            SET name = COALESCE($2, name),
                display_order = COALESCE($3, display_order)
            WHERE id = $1
            RETURNING id, section_id, name, display_order, created_at
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.display_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(sub_topic)
    }

    pub async fn delete_sub_topic(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM sub_topics WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Sub-topic not found".to_string()));
        }
        Ok(())
    }

    // ── differentiators ──

    pub async fn list_differentiators(&self, include_inactive: bool) -> Result<Vec<Differentiator>> {
        let rows = sqlx::query_as::<_, Differentiator>(
            r#"
            SELECT id, title, description, icon, display_order, is_active, created_at, updated_at
            FROM differentiators
            WHERE ($1 OR is_active = TRUE)
            ORDER BY display_order, created_at
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_differentiator(
        &self,
        payload: &CreateDifferentiatorRequest,
    ) -> Result<Differentiator> {
        Self::require_icon(&payload.icon)?;
        let row = sqlx::query_as::<_, Differentiator>(
            r#"
            INSERT INTO differentiators (title, description, icon, display_order)
            VALUES ($1, $2, $3, COALESCE($4, 0))
            RETURNING id, title, description, icon, display_order, is_active, created_at, updated_at
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.icon)
        .bind(payload.display_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_differentiator(
        &self,
        id: Uuid,
        payload: &UpdateDifferentiatorRequest,
    ) -> Result<Differentiator> {
        if let Some(icon) = &payload.icon {
            Self::require_icon(icon)?;
        }
        let row = sqlx::query_as::<_, Differentiator>(
            r#"
            UPDATE differentiators
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                icon = COALESCE($4, icon),
                display_order = COALESCE($5, display_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, icon, display_order, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.icon)
        .bind(payload.display_order)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_differentiator(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM differentiators WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Differentiator not found".to_string()));
        }
        Ok(())
    }
}
