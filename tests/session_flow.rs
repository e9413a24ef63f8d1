use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use quizr::error::QuizError;
use quizr::session::history::HistoryComparison;
use quizr::session::result::Performance;
use quizr::session::{Difficulty, FinishTrigger, Session, StoredResult, TestResult};
use quizr::source::builtin::BuiltinSource;
use quizr::source::{QuestionSource, ResultStore, Student, prepare_questions};
use quizr::store::json_store::JsonStore;
use quizr::wizard::{SettingsDraft, TestSettings};

fn make_store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let store = JsonStore::with_base_dir(dir.path().to_path_buf())
        .unwrap_or_else(|e| panic!("store: {e}"));
    (dir, store)
}

fn science_settings(source: &BuiltinSource) -> TestSettings {
    let subject = source
        .subjects()
        .unwrap()
        .into_iter()
        .find(|s| s.name == "Science")
        .unwrap();
    SettingsDraft::new(10, 5)
        .with_subject(subject)
        .with_difficulty(Difficulty::Intermediate)
        .with_student("Ada Lovelace", "ada@example.com")
        .finalize()
        .unwrap_or_else(|e| panic!("settings: {e}"))
}

fn start_session(id: u64, source: &BuiltinSource, store: &JsonStore) -> (Student, Session) {
    let settings = science_settings(source);
    let student = store
        .register_student(&settings.student_name, &settings.student_email)
        .unwrap();
    let fetched = source
        .fetch_questions(settings.subject.id, settings.difficulty)
        .unwrap();
    let questions = prepare_questions::<SmallRng>(fetched, settings.question_count, None).unwrap();
    let session = Session::new(id, student.id, settings, questions).unwrap();
    (student, session)
}

/// Answer every question, getting the first `wrong` of them wrong.
fn answer_all(session: &mut Session, wrong: usize) {
    let picks: Vec<(u64, String)> = session
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let pick = if i < wrong {
                q.options.iter().find(|o| **o != q.correct_option).unwrap()
            } else {
                &q.correct_option
            };
            (q.id, pick.clone())
        })
        .collect();
    for (id, option) in picks {
        assert!(session.select_answer(id, &option));
    }
}

fn expire(session: &mut Session) {
    while !session.is_expired() {
        session.tick();
    }
}

#[test]
fn perfect_run_is_scored_stored_and_listed() {
    let source = BuiltinSource::new();
    let (_dir, store) = make_store();
    let (student, mut session) = start_session(1, &source, &store);
    assert_eq!(session.len(), 5);

    answer_all(&mut session, 0);
    for _ in 0..90 {
        session.tick();
    }

    let result = session.begin_submission(FinishTrigger::Manual).unwrap();
    assert_eq!(result.correct_count, 5);
    assert_eq!(result.total_count, 5);
    assert_eq!(result.score_percent, 100.0);
    assert_eq!(result.time_spent_secs, 90);
    assert_eq!(result.performance(), Performance::from_score(100.0));

    let outcome = store.submit_result(&result);
    session.complete_submission(outcome);
    let stored = session.submission().stored().unwrap().clone();

    let history = store.fetch_history(student.id).unwrap();
    assert_eq!(history, vec![stored]);
}

#[test]
fn second_attempt_is_compared_with_the_first() {
    let source = BuiltinSource::new();
    let (_dir, store) = make_store();

    let (first_student, mut first) = start_session(1, &source, &store);
    answer_all(&mut first, 3);
    let result = first.begin_submission(FinishTrigger::Manual).unwrap();
    assert_eq!(result.score_percent, 40.0);
    first.complete_submission(store.submit_result(&result));

    let (second_student, mut second) = start_session(2, &source, &store);
    assert_eq!(first_student.id, second_student.id);
    answer_all(&mut second, 1);
    let result = second.begin_submission(FinishTrigger::Manual).unwrap();
    let stored = store.submit_result(&result).unwrap();

    let history = store.fetch_history(second_student.id).unwrap();
    let comparison = HistoryComparison::compute(&stored, &history);
    assert_eq!(comparison.attempts, 1);
    assert_eq!(comparison.previous_score, Some(40.0));
    assert_eq!(comparison.delta_from_previous(stored.result.score_percent), Some(40.0));
    assert!(comparison.is_personal_best(stored.result.score_percent));
}

#[test]
fn manual_finish_needs_every_answer() {
    let source = BuiltinSource::new();
    let (_dir, store) = make_store();
    let (_, mut session) = start_session(1, &source, &store);

    let first = session.current_question().clone();
    assert!(session.select_current(&first.correct_option));
    assert!(session.begin_submission(FinishTrigger::Manual).is_none());
    assert!(session.submission().is_idle());
}

#[test]
fn expiry_submits_partial_answers_once() {
    let source = BuiltinSource::new();
    let (_dir, store) = make_store();
    let (_, mut session) = start_session(1, &source, &store);

    let first = session.current_question().clone();
    session.select_current(&first.correct_option);
    expire(&mut session);

    let result = session.begin_submission(FinishTrigger::TimerExpired).unwrap();
    assert_eq!(result.correct_count, 1);
    assert_eq!(result.score_percent, 20.0);
    assert_eq!(result.time_spent_secs, 600);

    // The manual finish racing the expiry must not produce a second call.
    assert!(session.begin_submission(FinishTrigger::Manual).is_none());
    assert!(session.begin_submission(FinishTrigger::TimerExpired).is_none());
    assert!(session.is_locked());
}

struct FlakyStore {
    inner: JsonStore,
    failed_once: AtomicBool,
}

impl ResultStore for FlakyStore {
    fn register_student(&self, full_name: &str, email: &str) -> Result<Student, QuizError> {
        self.inner.register_student(full_name, email)
    }

    fn submit_result(&self, result: &TestResult) -> Result<StoredResult, QuizError> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(QuizError::submission("connection reset"));
        }
        self.inner.submit_result(result)
    }

    fn fetch_history(&self, student_id: u64) -> Result<Vec<StoredResult>, QuizError> {
        self.inner.fetch_history(student_id)
    }
}

#[test]
fn failed_submission_keeps_answers_and_retries() {
    let source = BuiltinSource::new();
    let (_dir, inner) = make_store();
    let (student, mut session) = start_session(1, &source, &inner);
    let store = FlakyStore {
        inner,
        failed_once: AtomicBool::new(false),
    };

    answer_all(&mut session, 2);
    let result = session.begin_submission(FinishTrigger::Manual).unwrap();
    session.complete_submission(store.submit_result(&result));

    assert!(session.submission().is_idle());
    assert_eq!(session.submission().attempts(), 1);
    assert!(matches!(
        session.submission().last_error(),
        Some(QuizError::SubmissionFailed(_))
    ));
    assert_eq!(session.answered_count(), 5);

    let retry = session.begin_submission(FinishTrigger::Manual).unwrap();
    assert_eq!(retry.correct_count, result.correct_count);
    session.complete_submission(store.submit_result(&retry));
    assert!(session.submission().is_submitted());
    assert_eq!(store.fetch_history(student.id).unwrap().len(), 1);
}

#[test]
fn shuffled_preparation_is_reproducible_for_a_seed() {
    let source = BuiltinSource::new();
    let fetched = source.fetch_questions(1, Difficulty::Beginner).unwrap();

    let mut a = SmallRng::seed_from_u64(42);
    let mut b = SmallRng::seed_from_u64(42);
    let first = prepare_questions(fetched.clone(), 5, Some(&mut a)).unwrap();
    let second = prepare_questions(fetched, 5, Some(&mut b)).unwrap();
    assert_eq!(first, second);
}
