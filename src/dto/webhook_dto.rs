use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Inbound webhook body. Exactly one of `raw_text` or `questions` is
/// expected; `prompt` only matters for the raw-text variant, where it
/// enqueues a completion-API drafting job for the reviewer.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub sub_topic_id: Uuid,
    pub sub_topic_name: Option<String>,
    pub prompt: Option<String>,
    pub raw_text: Option<String>,
    pub questions: Option<Vec<CandidateQuestion>>,
}

/// One externally produced question candidate. `answer` and the legacy
/// `correctAnswer` are both accepted on input; storage is normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQuestion {
    #[serde(rename = "type", default)]
    pub question_type: Option<String>,
    pub question: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub answer: Option<JsonValue>,
    #[serde(default, rename = "correctAnswer")]
    pub correct_answer: Option<JsonValue>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RawTextAccepted {
    pub event_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAccepted {
    pub success: bool,
    pub question_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEventsQuery {
    pub processed: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Final question batch an operator approves out of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveEventRequest {
    pub questions: Vec<CandidateQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproveEventResponse {
    pub event_id: Uuid,
    pub question_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateKeyRequest {
    pub source: String,
}

/// The plaintext key appears here once; only its digest is stored.
#[derive(Debug, Clone, Serialize)]
pub struct CreateKeyResponse {
    pub id: Uuid,
    pub source: String,
    pub key: String,
}
