use crate::error::QuizError;
use crate::session::result::StoredResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishTrigger {
    /// The user confirmed "finish"; requires every question answered.
    Manual,
    /// The countdown reached zero; completeness is not required.
    TimerExpired,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionState {
    Idle,
    Pending,
    Submitted(StoredResult),
}

/// One-shot guard around the external submission call.
///
/// `begin` succeeds only from `Idle`, so a manual finish and a timer expiry
/// arriving back to back produce a single call. A failure returns the gate to
/// `Idle` so the user can retry.
#[derive(Clone, Debug)]
pub struct SubmissionGate {
    state: SubmissionState,
    last_error: Option<QuizError>,
    attempts: u32,
}

impl Default for SubmissionGate {
    fn default() -> Self {
        Self {
            state: SubmissionState::Idle,
            last_error: None,
            attempts: 0,
        }
    }
}

impl SubmissionGate {
    pub fn begin(&mut self) -> bool {
        if self.state != SubmissionState::Idle {
            return false;
        }
        self.state = SubmissionState::Pending;
        self.attempts += 1;
        true
    }

    /// Apply the outcome of the external call. Outcomes that arrive while no
    /// call is in flight are ignored.
    pub fn complete(&mut self, outcome: Result<StoredResult, QuizError>) {
        if self.state != SubmissionState::Pending {
            log::warn!("ignoring submission outcome with no pending call");
            return;
        }
        match outcome {
            Ok(stored) => {
                self.last_error = None;
                self.state = SubmissionState::Submitted(stored);
            }
            Err(err) => {
                self.last_error = Some(err);
                self.state = SubmissionState::Idle;
            }
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SubmissionState::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.state == SubmissionState::Pending
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, SubmissionState::Submitted(_))
    }

    pub fn stored(&self) -> Option<&StoredResult> {
        match &self.state {
            SubmissionState::Submitted(stored) => Some(stored),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&QuizError> {
        self.last_error.as_ref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::question::Difficulty;
    use crate::session::result::TestResult;

    fn stored() -> StoredResult {
        StoredResult {
            id: 9,
            created_at: Utc::now(),
            result: TestResult {
                student_id: 1,
                subject_id: 1,
                difficulty: Difficulty::Beginner,
                correct_count: 1,
                total_count: 1,
                score_percent: 100.0,
                time_spent_secs: 10,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_second_begin_is_rejected_while_pending() {
        let mut gate = SubmissionGate::default();
        assert!(gate.begin());
        assert!(!gate.begin());
        assert!(gate.is_pending());
        assert_eq!(gate.attempts(), 1);
    }

    #[test]
    fn test_failure_reopens_gate_and_keeps_error() {
        let mut gate = SubmissionGate::default();
        assert!(gate.begin());
        gate.complete(Err(QuizError::submission("HTTP 503")));
        assert!(gate.is_idle());
        assert!(!gate.is_submitted());
        assert_eq!(gate.last_error(), Some(&QuizError::submission("HTTP 503")));
        assert!(gate.begin());
        assert_eq!(gate.attempts(), 2);
    }

    #[test]
    fn test_success_is_final() {
        let mut gate = SubmissionGate::default();
        assert!(gate.begin());
        gate.complete(Ok(stored()));
        assert!(gate.is_submitted());
        assert_eq!(gate.stored().map(|s| s.id), Some(9));
        assert!(!gate.begin());
    }

    #[test]
    fn test_stray_outcome_is_ignored() {
        let mut gate = SubmissionGate::default();
        gate.complete(Ok(stored()));
        assert!(gate.is_idle());
    }
}
