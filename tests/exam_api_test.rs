mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{delete, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use iqify_backend::exam::SessionQuestion;
use iqify_backend::{routes, AppState};

fn setup_app() -> (Router, AppState) {
    common::init_test_config();
    let state = AppState::new(common::lazy_pool());
    let app = Router::new()
        .route("/api/exams/:id/answer", patch(routes::exams::select_answer))
        .route("/api/exams/:id/position", patch(routes::exams::goto_position))
        .route("/api/exams/:id/submit", post(routes::exams::submit_exam))
        .route("/api/exams/:id/review", post(routes::exams::review_exam))
        .route("/api/exams/:id", delete(routes::exams::abandon_exam))
        .with_state(state.clone());
    (app, state)
}

fn snapshot() -> Vec<SessionQuestion> {
    vec![
        SessionQuestion {
            id: Uuid::new_v4(),
            question_type: "multiple_choice".to_string(),
            content: serde_json::from_value(json!({
                "question": "2 + 2?",
                "options": ["3", "4", "5"],
                "answer": "4",
            }))
            .unwrap(),
        },
        SessionQuestion {
            id: Uuid::new_v4(),
            question_type: "numeric".to_string(),
            content: serde_json::from_value(json!({
                "question": "Next in 1, 2, 4, 8?",
                "correctAnswer": 16,
            }))
            .unwrap(),
        },
    ]
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn patch_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (app, _state) = setup_app();
    let resp = app
        .oneshot(post_empty(&format!("/api/exams/{}/submit", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_without_answers_warns_and_keeps_session_open() {
    let (app, state) = setup_app();
    let session = state.sessions.create(None, Uuid::new_v4(), snapshot());

    let resp = app
        .clone()
        .oneshot(post_empty(&format!("/api/exams/{}/submit", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(resp).await;
    assert!(body["warning"].as_str().unwrap().contains("No answers"));

    // Still answerable and submittable afterwards.
    let q1 = session.questions[0].id;
    let resp = app
        .clone()
        .oneshot(patch_json(
            &format!("/api/exams/{}/answer", session.id),
            json!({ "question_id": q1, "answer": "4" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_empty(&format!("/api/exams/{}/submit", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["score"], 50);
    assert_eq!(body["correct"], 1);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn full_flow_scores_and_reviews() {
    let (app, state) = setup_app();
    let session = state.sessions.create(None, Uuid::new_v4(), snapshot());
    let q1 = session.questions[0].id;
    let q2 = session.questions[1].id;

    for (qid, answer) in [(q1, json!("4")), (q2, json!(16))] {
        let resp = app
            .clone()
            .oneshot(patch_json(
                &format!("/api/exams/{}/answer", session.id),
                json!({ "question_id": qid, "answer": answer }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["saved"], true);
    }

    let resp = app
        .clone()
        .oneshot(patch_json(
            &format!("/api/exams/{}/position", session.id),
            json!({ "index": 99 }),
        ))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["current_index"], 1);

    let resp = app
        .clone()
        .oneshot(post_empty(&format!("/api/exams/{}/submit", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["score"], 100);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    // Repeat submission is a conflict.
    let resp = app
        .clone()
        .oneshot(post_empty(&format!("/api/exams/{}/submit", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Review exposes the canonical answers the client never saw mid-exam.
    let resp = app
        .clone()
        .oneshot(post_empty(&format!("/api/exams/{}/review", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["review_mode"], true);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions
        .iter()
        .any(|q| q["content"]["answer"] == json!("4")));
}

#[tokio::test]
async fn review_before_submission_conflicts() {
    let (app, state) = setup_app();
    let session = state.sessions.create(None, Uuid::new_v4(), snapshot());
    let resp = app
        .oneshot(post_empty(&format!("/api/exams/{}/review", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn answer_outside_snapshot_is_rejected() {
    let (app, state) = setup_app();
    let session = state.sessions.create(None, Uuid::new_v4(), snapshot());
    let resp = app
        .oneshot(patch_json(
            &format!("/api/exams/{}/answer", session.id),
            json!({ "question_id": Uuid::new_v4(), "answer": "4" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn abandon_drops_the_session() {
    let (app, state) = setup_app();
    let session = state.sessions.create(None, Uuid::new_v4(), snapshot());

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/exams/{}", session.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(post_empty(&format!("/api/exams/{}/submit", session.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
