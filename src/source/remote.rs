use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;

use crate::error::QuizError;
use crate::session::question::{Difficulty, Question, Subject};
use crate::session::result::{StoredResult, TestResult};
use crate::source::schema::{
    self, ApiQuestion, ApiResult, ApiStudent, ApiSubject, NewResult, NewStudent,
};
use crate::source::{QuestionSource, ResultStore, Student};

/// Blocking client for the quiz REST API. Implements both the question
/// source and the result store.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuizError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuizError::source(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_text(&self, path: &str) -> Result<String, QuizError> {
        let url = self.url(path);
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| QuizError::source(format!("GET {url}: {e}")))?;
        read_body(response, &url).map_err(QuizError::SourceUnavailable)
    }

    fn post_json<T: serde::Serialize>(&self, path: &str, payload: &T) -> Result<String, QuizError> {
        let url = self.url(path);
        let body = serde_json::to_string(payload)
            .map_err(|e| QuizError::submission(format!("cannot encode request: {e}")))?;
        log::debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| QuizError::submission(format!("POST {url}: {e}")))?;
        read_body(response, &url).map_err(QuizError::SubmissionFailed)
    }
}

fn read_body(response: Response, url: &str) -> Result<String, String> {
    let status = response.status();
    if !status.is_success() {
        return Err(format!("{url} returned {status}"));
    }
    response
        .text()
        .map_err(|e| format!("reading {url}: {e}"))
}

impl QuestionSource for ApiClient {
    fn subjects(&self) -> Result<Vec<Subject>, QuizError> {
        let body = self.get_text("subjects")?;
        let raw: Vec<ApiSubject> = schema::decode(&body, "subject list")?;
        Ok(raw.into_iter().map(Subject::from).collect())
    }

    fn fetch_questions(
        &self,
        subject_id: u32,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, QuizError> {
        let body = self.get_text(&format!("subjects/{subject_id}/{}", difficulty.as_str()))?;
        let raw: Vec<ApiQuestion> = schema::decode(&body, "question list")?;
        schema::validate_questions(raw)
    }
}

impl ResultStore for ApiClient {
    fn register_student(&self, full_name: &str, email: &str) -> Result<Student, QuizError> {
        let body = self.post_json("students", &NewStudent { full_name, email })?;
        let student: ApiStudent = serde_json::from_str(&body)
            .map_err(|e| QuizError::submission(format!("malformed student record: {e}")))?;
        Ok(student.into())
    }

    fn submit_result(&self, result: &TestResult) -> Result<StoredResult, QuizError> {
        let body = self.post_json("results", &NewResult::from(result))?;
        let stored: ApiResult = serde_json::from_str(&body)
            .map_err(|e| QuizError::submission(format!("malformed result receipt: {e}")))?;
        Ok(stored.into_stored(result.difficulty))
    }

    /// The API has no per-student endpoint, so the full list is filtered here.
    fn fetch_history(&self, student_id: u64) -> Result<Vec<StoredResult>, QuizError> {
        let body = self.get_text("results")?;
        let raw: Vec<ApiResult> = schema::decode(&body, "result list")?;
        Ok(raw
            .into_iter()
            .filter(|r| r.student_id == student_id)
            .map(|r| r.into_stored(Difficulty::Beginner))
            .collect())
    }
}
