#![cfg(feature = "network")]

mod common;

use std::net::TcpListener;
use std::time::Duration;

use chrono::Utc;
use quizr::error::QuizError;
use quizr::session::{Difficulty, TestResult};
use quizr::source::remote::ApiClient;
use quizr::source::{QuestionSource, ResultStore};

use common::CannedServer;

const QUESTIONS: &str = r#"[
    {"id": 11, "subject_id": 2, "question": "What is the chemical symbol for water?",
     "options": ["H2O", "CO2", "NaCl", "O2"], "correct_option": "H2O",
     "created_at": "2026-01-10T08:00:00Z", "created_by": 1},
    {"id": 12, "subject_id": 2, "question": "Which planet is known as the Red Planet?",
     "options": ["Mars", "Venus", "Jupiter", "Saturn"], "correct_option": "Mars"}
]"#;

const RESULTS: &str = r#"[
    {"id": 1, "student_id": 7, "subject_id": 2, "score": 50.0, "time_spent": 300,
     "correct_answers": 1, "total_questions": 2, "created_at": "2026-02-01T10:00:00Z"},
    {"id": 2, "student_id": 8, "subject_id": 2, "score": 100.0, "time_spent": 200,
     "correct_answers": 2, "total_questions": 2, "created_at": "2026-02-02T10:00:00Z"},
    {"id": 3, "student_id": 7, "subject_id": 1, "difficulty": "advanced", "score": 80.0,
     "time_spent": 400, "correct_answers": 4, "total_questions": 5,
     "created_at": "2026-02-03T10:00:00Z"}
]"#;

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn sample_result() -> TestResult {
    TestResult {
        student_id: 7,
        subject_id: 2,
        difficulty: Difficulty::Intermediate,
        correct_count: 1,
        total_count: 2,
        score_percent: 50.0,
        time_spent_secs: 600,
        created_at: Utc::now(),
    }
}

#[test]
fn fetches_subjects_and_questions() {
    let server = CannedServer::new()
        .route("GET", "/subjects", 200, r#"[{"id": 2, "name": "Science"}]"#)
        .route("GET", "/subjects/2/intermediate", 200, QUESTIONS)
        .start();
    let api = client(&server.base_url);

    let subjects = api.subjects().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].name, "Science");

    let questions = api.fetch_questions(2, Difficulty::Intermediate).unwrap();
    let ids: Vec<u64> = questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![11, 12]);
    assert_eq!(questions[1].correct_option, "Mars");
}

#[test]
fn trailing_slash_in_base_url_is_ignored() {
    let server = CannedServer::new()
        .route("GET", "/subjects", 200, "[]")
        .start();
    let api = client(&format!("{}/", server.base_url));
    assert!(api.subjects().unwrap().is_empty());
    assert_eq!(server.recorded()[0].path, "/subjects");
}

#[test]
fn malformed_question_payload_is_source_unavailable() {
    let server = CannedServer::new()
        .route("GET", "/subjects/1/beginner", 200, r#"{"questions": "nope"}"#)
        .start();
    let err = client(&server.base_url)
        .fetch_questions(1, Difficulty::Beginner)
        .unwrap_err();
    assert!(matches!(err, QuizError::SourceUnavailable(_)));
}

#[test]
fn empty_question_list_is_source_unavailable() {
    let server = CannedServer::new()
        .route("GET", "/subjects/1/advanced", 200, "[]")
        .start();
    let err = client(&server.base_url)
        .fetch_questions(1, Difficulty::Advanced)
        .unwrap_err();
    assert!(matches!(err, QuizError::SourceUnavailable(_)));
}

#[test]
fn server_error_on_fetch_is_source_unavailable() {
    let server = CannedServer::new()
        .route("GET", "/subjects/1/beginner", 500, r#"{"detail":"boom"}"#)
        .start();
    let err = client(&server.base_url)
        .fetch_questions(1, Difficulty::Beginner)
        .unwrap_err();
    assert!(matches!(err, QuizError::SourceUnavailable(_)));
    assert!(err.to_string().contains("500"));
}

#[test]
fn registers_student_with_wire_field_names() {
    let server = CannedServer::new()
        .route(
            "POST",
            "/students",
            200,
            r#"{"id": 7, "full_name": "Ada Lovelace", "email": "ada@example.com"}"#,
        )
        .start();
    let student = client(&server.base_url)
        .register_student("Ada Lovelace", "ada@example.com")
        .unwrap();
    assert_eq!(student.id, 7);

    let sent: serde_json::Value = serde_json::from_str(&server.recorded()[0].body).unwrap();
    assert_eq!(sent["full_name"], "Ada Lovelace");
    assert_eq!(sent["email"], "ada@example.com");
}

#[test]
fn submits_result_and_reads_receipt() {
    let server = CannedServer::new()
        .route(
            "POST",
            "/results",
            201,
            r#"{"id": 42, "student_id": 7, "subject_id": 2, "difficulty": "intermediate",
                "score": 50.0, "time_spent": 600, "correct_answers": 1,
                "total_questions": 2, "created_at": "2026-03-01T12:00:00Z"}"#,
        )
        .start();
    let stored = client(&server.base_url)
        .submit_result(&sample_result())
        .unwrap();
    assert_eq!(stored.id, 42);
    assert_eq!(stored.result.difficulty, Difficulty::Intermediate);

    let recorded = server.recorded();
    assert_eq!(recorded[0].method, "POST");
    let sent: serde_json::Value = serde_json::from_str(&recorded[0].body).unwrap();
    assert_eq!(sent["student_id"], 7);
    assert_eq!(sent["subject_id"], 2);
    assert_eq!(sent["difficulty"], "intermediate");
    assert_eq!(sent["score"], 50.0);
    assert_eq!(sent["time_spent"], 600);
    assert_eq!(sent["correct_answers"], 1);
    assert_eq!(sent["total_questions"], 2);
}

#[test]
fn rejected_submission_is_submission_failed() {
    let server = CannedServer::new()
        .route("POST", "/results", 500, r#"{"detail":"db down"}"#)
        .start();
    let err = client(&server.base_url)
        .submit_result(&sample_result())
        .unwrap_err();
    assert!(matches!(err, QuizError::SubmissionFailed(_)));
    assert!(err.is_retryable());
}

#[test]
fn history_is_filtered_to_the_student() {
    let server = CannedServer::new()
        .route("GET", "/results", 200, RESULTS)
        .start();
    let history = client(&server.base_url).fetch_history(7).unwrap();
    let ids: Vec<u64> = history.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(history[1].result.difficulty, Difficulty::Advanced);
}

#[test]
fn unreachable_server_is_source_unavailable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client(&format!("http://127.0.0.1:{port}"))
        .subjects()
        .unwrap_err();
    assert!(matches!(err, QuizError::SourceUnavailable(_)));
}
