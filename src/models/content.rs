use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubTopic {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatsCard {
    pub id: Uuid,
    pub label: String,
    pub value: String,
    pub icon: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Differentiator {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of display icons. The stored column is TEXT; unknown names
/// are rejected at the API edge rather than falling through to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Brain,
    Trophy,
    Target,
    Star,
    Users,
    Clock,
    Chart,
    Puzzle,
    Medal,
    Flame,
    Book,
    Lightning,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Brain => "brain",
            Icon::Trophy => "trophy",
            Icon::Target => "target",
            Icon::Star => "star",
            Icon::Users => "users",
            Icon::Clock => "clock",
            Icon::Chart => "chart",
            Icon::Puzzle => "puzzle",
            Icon::Medal => "medal",
            Icon::Flame => "flame",
            Icon::Book => "book",
            Icon::Lightning => "lightning",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "brain" => Some(Icon::Brain),
            "trophy" => Some(Icon::Trophy),
            "target" => Some(Icon::Target),
            "star" => Some(Icon::Star),
            "users" => Some(Icon::Users),
            "clock" => Some(Icon::Clock),
            "chart" => Some(Icon::Chart),
            "puzzle" => Some(Icon::Puzzle),
            "medal" => Some(Icon::Medal),
            "flame" => Some(Icon::Flame),
            "book" => Some(Icon::Book),
            "lightning" => Some(Icon::Lightning),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_parse_round_trips_known_names() {
        for raw in ["brain", "trophy", "target", "flame"] {
            let icon = Icon::parse(raw).expect("known icon");
            assert_eq!(icon.as_str(), raw);
        }
    }

    #[test]
    fn icon_parse_rejects_unknown_names() {
        assert!(Icon::parse("sparkles").is_none());
        assert!(Icon::parse("").is_none());
    }
}
