//! Wire shapes of the quiz REST API and their conversion into domain types.
//!
//! Every payload is decoded into one of these structs and checked before it
//! reaches a session; anything malformed is reported as `SourceUnavailable`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::session::question::{Difficulty, Question, Subject};
use crate::session::result::{StoredResult, TestResult};
use crate::source::Student;

#[derive(Clone, Debug, Deserialize)]
pub struct ApiSubject {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[allow(dead_code)] // bookkeeping fields are decoded but unused
pub struct ApiQuestion {
    pub id: u64,
    #[serde(default)]
    pub subject_id: Option<u32>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewStudent<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiStudent {
    pub id: u64,
    pub full_name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewResult {
    pub student_id: u64,
    pub subject_id: u32,
    pub difficulty: Difficulty,
    pub score: f64,
    pub time_spent: u32,
    pub correct_answers: usize,
    pub total_questions: usize,
}

impl From<&TestResult> for NewResult {
    fn from(r: &TestResult) -> Self {
        Self {
            student_id: r.student_id,
            subject_id: r.subject_id,
            difficulty: r.difficulty,
            score: r.score_percent,
            time_spent: r.time_spent_secs,
            correct_answers: r.correct_count,
            total_questions: r.total_count,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiResult {
    pub id: u64,
    pub student_id: u64,
    pub subject_id: u32,
    /// Older servers do not echo the difficulty back.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub score: f64,
    pub time_spent: u32,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub created_at: DateTime<Utc>,
}

pub fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, QuizError> {
    serde_json::from_str(body).map_err(|e| QuizError::source(format!("malformed {what}: {e}")))
}

impl From<ApiSubject> for Subject {
    fn from(s: ApiSubject) -> Self {
        Subject { id: s.id, name: s.name }
    }
}

impl From<ApiStudent> for Student {
    fn from(s: ApiStudent) -> Self {
        Student {
            id: s.id,
            full_name: s.full_name,
            email: s.email,
        }
    }
}

impl TryFrom<ApiQuestion> for Question {
    type Error = QuizError;

    fn try_from(q: ApiQuestion) -> Result<Self, Self::Error> {
        if q.question.trim().is_empty() {
            return Err(QuizError::source(format!("question {} has no prompt", q.id)));
        }
        if q.options.is_empty() {
            return Err(QuizError::source(format!("question {} has no options", q.id)));
        }
        if !q.options.contains(&q.correct_option) {
            return Err(QuizError::source(format!(
                "question {} lists a correct option that is not among its options",
                q.id
            )));
        }
        Ok(Question {
            id: q.id,
            prompt: q.question,
            options: q.options,
            correct_option: q.correct_option,
        })
    }
}

/// Convert a fetched question list, rejecting it as a whole on any problem.
pub fn validate_questions(raw: Vec<ApiQuestion>) -> Result<Vec<Question>, QuizError> {
    if raw.is_empty() {
        return Err(QuizError::source("no questions returned"));
    }
    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raw.len());
    for q in raw {
        if !seen.insert(q.id) {
            return Err(QuizError::source(format!("duplicate question id {}", q.id)));
        }
        questions.push(Question::try_from(q)?);
    }
    Ok(questions)
}

impl ApiResult {
    /// `fallback` fills in the difficulty when the server omitted it.
    pub fn into_stored(self, fallback: Difficulty) -> StoredResult {
        StoredResult {
            id: self.id,
            created_at: self.created_at,
            result: TestResult {
                student_id: self.student_id,
                subject_id: self.subject_id,
                difficulty: self.difficulty.unwrap_or(fallback),
                correct_count: self.correct_answers,
                total_count: self.total_questions,
                score_percent: self.score,
                time_spent_secs: self.time_spent,
                created_at: self.created_at,
            },
        }
    }
}
