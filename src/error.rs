use thiserror::Error;

/// Failures surfaced by the question source and the result store.
///
/// Both kinds are recoverable: the caller either returns the user to the
/// setup wizard or offers a retry. Neither ever discards a running session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// A question, subject or history fetch failed (network, status or payload).
    #[error("question source unavailable: {0}")]
    SourceUnavailable(String),
    /// Persisting a result or a student record failed.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

impl QuizError {
    pub fn source(msg: impl Into<String>) -> Self {
        QuizError::SourceUnavailable(msg.into())
    }

    pub fn submission(msg: impl Into<String>) -> Self {
        QuizError::SubmissionFailed(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, QuizError::SubmissionFailed(_))
    }
}
