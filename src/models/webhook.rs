use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// A registered external content source. Only the sha-256 digest of the
/// shared secret is stored; the plaintext is shown once at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookKey {
    pub id: Uuid,
    pub source: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Inbound payload held for human review. Events are never deleted
/// automatically and only flip `processed` through operator approval.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub payload: JsonValue,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
