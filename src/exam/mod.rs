pub mod session;

use crate::models::question::QuestionContent;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// One question as snapshotted into an exam session. The content keeps its
/// canonical answer; handlers strip it before serving in-progress clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionQuestion {
    pub id: Uuid,
    pub question_type: String,
    pub content: QuestionContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub correct: bool,
    pub submitted: Option<JsonValue>,
    pub canonical: Option<JsonValue>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub score: i32,
    pub correct: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

/// Single-pass grading over a question snapshot.
///
/// A question with no canonical answer, or with no submitted answer,
/// contributes nothing to the correct count but still counts toward the
/// total, so unanswered questions pull the score down. The final score is
/// `round(correct / total * 100)`; an empty snapshot scores 0.
pub fn score_answers(
    questions: &[SessionQuestion],
    answers: &HashMap<Uuid, JsonValue>,
) -> ScoreBreakdown {
    let total = questions.len();
    let mut correct = 0usize;
    let mut results = Vec::with_capacity(total);

    for q in questions {
        let canonical = q.content.canonical_answer().cloned();
        let submitted = answers.get(&q.id).filter(|v| !v.is_null()).cloned();
        let is_correct = match (&canonical, &submitted) {
            (Some(expected), Some(given)) => answers_match(given, expected),
            _ => false,
        };
        if is_correct {
            correct += 1;
        }
        results.push(QuestionResult {
            question_id: q.id,
            correct: is_correct,
            submitted,
            canonical,
            explanation: q.content.explanation.clone(),
        });
    }

    let score = if total == 0 {
        0
    } else {
        ((correct as f64 / total as f64) * 100.0).round() as i32
    };

    ScoreBreakdown {
        score,
        correct,
        total,
        results,
    }
}

/// Numeric equality when both sides are numbers, otherwise both sides are
/// coerced to strings and compared (so `2` matches `"2"` and `"B"` matches
/// `"B"` but never `"b"`).
pub fn answers_match(submitted: &JsonValue, canonical: &JsonValue) -> bool {
    if let (Some(a), Some(b)) = (submitted.as_f64(), canonical.as_f64()) {
        return a == b;
    }
    coerce_to_string(submitted) == coerce_to_string(canonical)
}

fn coerce_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(id: Uuid, content: JsonValue) -> SessionQuestion {
        SessionQuestion {
            id,
            question_type: "multiple_choice".to_string(),
            content: serde_json::from_value(content).unwrap(),
        }
    }

    #[test]
    fn all_correct_scores_one_hundred() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let questions = vec![
            question(q1, json!({"question": "q1", "answer": "B"})),
            question(q2, json!({"question": "q2", "correctAnswer": 2})),
        ];
        let answers = HashMap::from([(q1, json!("B")), (q2, json!(2))]);

        let breakdown = score_answers(&questions, &answers);
        assert_eq!(breakdown.score, 100);
        assert_eq!(breakdown.correct, 2);
        assert_eq!(breakdown.total, 2);
    }

    #[test]
    fn unanswered_questions_count_against_the_score() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let questions = vec![
            question(q1, json!({"question": "q1", "answer": "B"})),
            question(q2, json!({"question": "q2", "correctAnswer": 2})),
        ];
        let answers = HashMap::from([(q1, json!("A"))]);

        let breakdown = score_answers(&questions, &answers);
        assert_eq!(breakdown.score, 0);

        let answers = HashMap::from([(q1, json!("B"))]);
        let breakdown = score_answers(&questions, &answers);
        assert_eq!(breakdown.score, 50);
        assert_eq!(breakdown.correct, 1);
    }

    #[test]
    fn mixed_types_coerce_to_string() {
        let q = Uuid::new_v4();
        let questions = vec![question(q, json!({"question": "q", "answer": "2"}))];
        let answers = HashMap::from([(q, json!(2))]);
        assert_eq!(score_answers(&questions, &answers).score, 100);
    }

    #[test]
    fn numeric_answers_compare_numerically() {
        let q = Uuid::new_v4();
        let questions = vec![question(q, json!({"question": "q", "answer": 2.0}))];
        let answers = HashMap::from([(q, json!(2))]);
        assert_eq!(score_answers(&questions, &answers).score, 100);
    }

    #[test]
    fn question_without_canonical_answer_still_counts_toward_total() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let questions = vec![
            question(q1, json!({"question": "broken row"})),
            question(q2, json!({"question": "q2", "answer": "A"})),
        ];
        let answers = HashMap::from([(q1, json!("anything")), (q2, json!("A"))]);

        let breakdown = score_answers(&questions, &answers);
        assert_eq!(breakdown.total, 2);
        assert_eq!(breakdown.correct, 1);
        assert_eq!(breakdown.score, 50);
    }

    #[test]
    fn empty_snapshot_scores_zero() {
        let breakdown = score_answers(&[], &HashMap::new());
        assert_eq!(breakdown.score, 0);
        assert_eq!(breakdown.total, 0);
    }

    #[test]
    fn null_submission_is_treated_as_unanswered() {
        let q = Uuid::new_v4();
        let questions = vec![question(q, json!({"question": "q", "answer": "null"}))];
        let answers = HashMap::from([(q, JsonValue::Null)]);
        let breakdown = score_answers(&questions, &answers);
        assert_eq!(breakdown.correct, 0);
        assert!(breakdown.results[0].submitted.is_none());
    }

    #[test]
    fn rounding_is_to_nearest_integer() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let questions: Vec<SessionQuestion> = ids
            .iter()
            .map(|id| question(*id, json!({"question": "q", "answer": "A"})))
            .collect();
        let answers = HashMap::from([(ids[0], json!("A"))]);
        // 1/3 -> 33.33 -> 33
        assert_eq!(score_answers(&questions, &answers).score, 33);
        let answers = HashMap::from([(ids[0], json!("A")), (ids[1], json!("A"))]);
        // 2/3 -> 66.67 -> 67
        assert_eq!(score_answers(&questions, &answers).score, 67);
    }
}
