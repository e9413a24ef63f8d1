pub mod builtin;
#[cfg(feature = "network")]
pub mod remote;
pub mod schema;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::session::question::{Difficulty, Question, Subject};
use crate::session::result::{StoredResult, TestResult};

/// Supplies subjects and the ordered question list for a test.
pub trait QuestionSource: Send + Sync {
    fn subjects(&self) -> Result<Vec<Subject>, QuizError>;

    fn fetch_questions(
        &self,
        subject_id: u32,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, QuizError>;
}

/// Persists students and results, and serves result history.
pub trait ResultStore: Send + Sync {
    fn register_student(&self, full_name: &str, email: &str) -> Result<Student, QuizError>;

    fn submit_result(&self, result: &TestResult) -> Result<StoredResult, QuizError>;

    fn fetch_history(&self, student_id: u64) -> Result<Vec<StoredResult>, QuizError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub full_name: String,
    pub email: String,
}

/// Cut the fetched list down to `count` questions, optionally shuffling first.
pub fn prepare_questions<R: Rng>(
    mut questions: Vec<Question>,
    count: usize,
    rng: Option<&mut R>,
) -> Result<Vec<Question>, QuizError> {
    if questions.is_empty() {
        return Err(QuizError::source("the question source returned no questions"));
    }
    if let Some(rng) = rng {
        questions.shuffle(rng);
    }
    if questions.len() < count {
        log::info!(
            "requested {count} questions but only {} are available",
            questions.len()
        );
    }
    questions.truncate(count.max(1));
    Ok(questions)
}
