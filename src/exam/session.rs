use crate::error::{Error, Result};
use crate::exam::{score_answers, ScoreBreakdown, SessionQuestion};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One in-progress exam, scoped to a single client. Sessions live only in
/// process memory; results are returned to the caller and never persisted.
#[derive(Debug, Clone)]
pub struct ExamSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub sub_topic_id: Uuid,
    pub questions: Vec<SessionQuestion>,
    pub answers: HashMap<Uuid, JsonValue>,
    pub current_index: usize,
    pub completed: bool,
    pub review_mode: bool,
    pub created_at: DateTime<Utc>,
    pub last_touched_at: DateTime<Utc>,
}

/// Outcome of a submit call. Submitting with nothing answered is a soft
/// failure: the session is left untouched and no score exists.
#[derive(Debug)]
pub enum SubmitOutcome {
    NoAnswers,
    Scored(ScoreBreakdown),
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, ExamSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        user_id: Option<Uuid>,
        sub_topic_id: Uuid,
        questions: Vec<SessionQuestion>,
    ) -> ExamSession {
        let now = Utc::now();
        let session = ExamSession {
            id: Uuid::new_v4(),
            user_id,
            sub_topic_id,
            questions,
            answers: HashMap::new(),
            current_index: 0,
            completed: false,
            review_mode: false,
            created_at: now,
            last_touched_at: now,
        };
        let mut map = self.lock();
        map.insert(session.id, session.clone());
        session
    }

    /// Records or overwrites one answer. Once the session is completed and
    /// not in review mode this is a no-op; the caller still gets Ok so the
    /// client UI stays quiet about it.
    pub fn select_answer(&self, id: Uuid, question_id: Uuid, value: JsonValue) -> Result<bool> {
        let mut map = self.lock();
        let session = map
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))?;
        session.last_touched_at = Utc::now();
        if session.completed && !session.review_mode {
            return Ok(false);
        }
        if !session.questions.iter().any(|q| q.id == question_id) {
            return Err(Error::BadRequest(
                "Question is not part of this exam".to_string(),
            ));
        }
        session.answers.insert(question_id, value);
        Ok(true)
    }

    /// Moves the current position, clamped to the snapshot range.
    pub fn goto(&self, id: Uuid, index: usize) -> Result<usize> {
        let mut map = self.lock();
        let session = map
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))?;
        session.last_touched_at = Utc::now();
        let max = session.questions.len().saturating_sub(1);
        session.current_index = index.min(max);
        Ok(session.current_index)
    }

    pub fn submit(&self, id: Uuid) -> Result<SubmitOutcome> {
        let mut map = self.lock();
        let session = map
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))?;
        session.last_touched_at = Utc::now();
        if session.completed {
            return Err(Error::Conflict(
                "Exam has already been submitted".to_string(),
            ));
        }
        if session.answers.values().all(|v| v.is_null()) || session.answers.is_empty() {
            return Ok(SubmitOutcome::NoAnswers);
        }
        let breakdown = score_answers(&session.questions, &session.answers);
        session.completed = true;
        Ok(SubmitOutcome::Scored(breakdown))
    }

    /// Enters review mode and returns the full snapshot, answers included.
    /// Only valid after completion.
    pub fn review(&self, id: Uuid) -> Result<ExamSession> {
        let mut map = self.lock();
        let session = map
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))?;
        if !session.completed {
            return Err(Error::Conflict(
                "Exam must be submitted before review".to_string(),
            ));
        }
        session.review_mode = true;
        session.last_touched_at = Utc::now();
        Ok(session.clone())
    }

    pub fn get(&self, id: Uuid) -> Result<ExamSession> {
        let map = self.lock();
        map.get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))
    }

    pub fn abandon(&self, id: Uuid) -> Result<()> {
        let mut map = self.lock();
        map.remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))
    }

    /// Drops sessions idle beyond the TTL. Returns how many were removed.
    pub fn sweep_idle(&self, ttl_minutes: i64) -> usize {
        let cutoff = Utc::now() - Duration::minutes(ttl_minutes);
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, s| s.last_touched_at > cutoff);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ExamSession>> {
        self.inner.lock().expect("session registry mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Vec<SessionQuestion> {
        vec![
            SessionQuestion {
                id: Uuid::new_v4(),
                question_type: "multiple_choice".to_string(),
                content: serde_json::from_value(json!({"question": "q1", "answer": "B"}))
                    .unwrap(),
            },
            SessionQuestion {
                id: Uuid::new_v4(),
                question_type: "multiple_choice".to_string(),
                content: serde_json::from_value(json!({"question": "q2", "correctAnswer": 2}))
                    .unwrap(),
            },
        ]
    }

    #[test]
    fn submit_with_no_answers_is_a_soft_failure() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());

        match registry.submit(session.id).unwrap() {
            SubmitOutcome::NoAnswers => {}
            SubmitOutcome::Scored(_) => panic!("expected no score"),
        }
        // State unchanged: a later real submission still works.
        let q1 = registry.get(session.id).unwrap().questions[0].id;
        registry.select_answer(session.id, q1, json!("B")).unwrap();
        match registry.submit(session.id).unwrap() {
            SubmitOutcome::Scored(b) => assert_eq!(b.score, 50),
            SubmitOutcome::NoAnswers => panic!("expected score"),
        }
    }

    #[test]
    fn repeat_submission_conflicts() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());
        let q1 = session.questions[0].id;
        registry.select_answer(session.id, q1, json!("B")).unwrap();
        registry.submit(session.id).unwrap();
        assert!(matches!(
            registry.submit(session.id),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn answers_after_completion_are_ignored_outside_review() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());
        let q1 = session.questions[0].id;
        registry.select_answer(session.id, q1, json!("B")).unwrap();
        registry.submit(session.id).unwrap();

        let saved = registry.select_answer(session.id, q1, json!("A")).unwrap();
        assert!(!saved);
        assert_eq!(
            registry.get(session.id).unwrap().answers.get(&q1),
            Some(&json!("B"))
        );
    }

    #[test]
    fn review_requires_completion() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());
        assert!(matches!(registry.review(session.id), Err(Error::Conflict(_))));

        let q1 = session.questions[0].id;
        registry.select_answer(session.id, q1, json!("B")).unwrap();
        registry.submit(session.id).unwrap();
        let reviewed = registry.review(session.id).unwrap();
        assert!(reviewed.review_mode);
    }

    #[test]
    fn goto_clamps_to_snapshot_range() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());
        assert_eq!(registry.goto(session.id, 99).unwrap(), 1);
        assert_eq!(registry.goto(session.id, 0).unwrap(), 0);
    }

    #[test]
    fn sweep_drops_idle_sessions() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());
        {
            let mut map = registry.inner.lock().unwrap();
            map.get_mut(&session.id).unwrap().last_touched_at =
                Utc::now() - Duration::minutes(120);
        }
        assert_eq!(registry.sweep_idle(60), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn abandon_removes_the_session() {
        let registry = SessionRegistry::new();
        let session = registry.create(None, Uuid::new_v4(), snapshot());
        registry.abandon(session.id).unwrap();
        assert!(matches!(registry.get(session.id), Err(Error::NotFound(_))));
    }
}
