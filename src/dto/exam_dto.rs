use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::exam::QuestionResult;
use crate::models::question::QuestionContent;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartExamRequest {
    pub sub_topic_id: Uuid,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// A question as served to an in-progress client: canonical answer and
/// explanation stripped.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question_type: String,
    pub content: QuestionContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartExamResponse {
    pub session_id: Uuid,
    pub sub_topic_id: Uuid,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectAnswerRequest {
    pub question_id: Uuid,
    pub answer: JsonValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectAnswerResponse {
    pub saved: bool,
    pub question_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionRequest {
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitExamResponse {
    pub session_id: Uuid,
    pub score: i32,
    pub correct: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub session_id: Uuid,
    pub review_mode: bool,
    pub questions: Vec<ReviewQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQuestion {
    pub id: Uuid,
    pub question_type: String,
    pub content: QuestionContent,
    pub submitted: Option<JsonValue>,
}
