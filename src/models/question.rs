use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub sub_topic_id: Uuid,
    pub question_type: String,
    pub content: JsonValue,
    pub source: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Text,
    Image,
    DualChoice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Text => "text",
            QuestionType::Image => "image",
            QuestionType::DualChoice => "dual_choice",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "text" => Some(QuestionType::Text),
            "image" => Some(QuestionType::Image),
            "dual_choice" => Some(QuestionType::DualChoice),
            _ => None,
        }
    }
}

/// The jsonb payload of a question row. The correct answer historically
/// lives in either `answer` or `correctAnswer`; reads must tolerate both,
/// writes normalize into `answer` (see `normalize`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionContent {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<JsonValue>,
    #[serde(
        default,
        rename = "correctAnswer",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_answer: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl QuestionContent {
    /// Resolves the canonical correct answer: `answer` first, the legacy
    /// `correctAnswer` as fallback. JSON null counts as absent.
    pub fn canonical_answer(&self) -> Option<&JsonValue> {
        self.answer
            .as_ref()
            .filter(|v| !v.is_null())
            .or_else(|| self.correct_answer.as_ref().filter(|v| !v.is_null()))
    }

    /// Moves a legacy `correctAnswer` into the canonical `answer` field.
    /// New rows are stored normalized; existing data keeps the read-side
    /// fallback above.
    pub fn normalize(&mut self) {
        if self.answer.as_ref().map_or(true, |v| v.is_null()) {
            if let Some(legacy) = self.correct_answer.take() {
                if !legacy.is_null() {
                    self.answer = Some(legacy);
                }
            }
        }
        self.correct_answer = None;
    }

    /// Copy with the canonical answer and explanation removed, for
    /// serving to an in-progress exam client.
    pub fn sanitized(&self) -> QuestionContent {
        QuestionContent {
            question: self.question.clone(),
            options: self.options.clone(),
            answer: None,
            correct_answer: None,
            explanation: None,
            media_url: self.media_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_answer_prefers_answer_field() {
        let content: QuestionContent = serde_json::from_value(json!({
            "question": "Pick one",
            "answer": "B",
            "correctAnswer": 2
        }))
        .unwrap();
        assert_eq!(content.canonical_answer(), Some(&json!("B")));
    }

    #[test]
    fn canonical_answer_falls_back_to_legacy_field() {
        let content: QuestionContent = serde_json::from_value(json!({
            "question": "Pick one",
            "correctAnswer": 2
        }))
        .unwrap();
        assert_eq!(content.canonical_answer(), Some(&json!(2)));
    }

    #[test]
    fn null_answer_counts_as_absent() {
        let content: QuestionContent = serde_json::from_value(json!({
            "question": "Pick one",
            "answer": null,
            "correctAnswer": "C"
        }))
        .unwrap();
        assert_eq!(content.canonical_answer(), Some(&json!("C")));
    }

    #[test]
    fn normalize_moves_legacy_field() {
        let mut content: QuestionContent = serde_json::from_value(json!({
            "question": "Pick one",
            "correctAnswer": 2
        }))
        .unwrap();
        content.normalize();
        assert_eq!(content.answer, Some(json!(2)));
        assert!(content.correct_answer.is_none());

        let stored = serde_json::to_value(&content).unwrap();
        assert!(stored.get("correctAnswer").is_none());
    }

    #[test]
    fn sanitized_strips_answers_and_explanation() {
        let content: QuestionContent = serde_json::from_value(json!({
            "question": "Pick one",
            "options": ["A", "B"],
            "answer": "B",
            "explanation": "because",
            "media_url": "/uploads/x.png"
        }))
        .unwrap();
        let public = content.sanitized();
        assert!(public.answer.is_none());
        assert!(public.explanation.is_none());
        assert_eq!(public.media_url.as_deref(), Some("/uploads/x.png"));
    }
}
