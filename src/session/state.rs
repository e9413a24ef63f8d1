use std::collections::{HashMap, HashSet};

use crate::error::QuizError;
use crate::session::question::{Question, QuestionId};
use crate::session::result::{StoredResult, TestResult};
use crate::session::submit::{FinishTrigger, SubmissionGate};
use crate::session::timer::{Countdown, TickOutcome, Ticker};
use crate::wizard::TestSettings;

/// One test-taking run: the fixed question list, the answers recorded so far,
/// the countdown and the submission guard.
///
/// `current` always indexes a valid question and every key in `answers` is
/// the id of a question in this session.
pub struct Session {
    id: u64,
    student_id: u64,
    settings: TestSettings,
    questions: Vec<Question>,
    answers: HashMap<QuestionId, String>,
    current: usize,
    countdown: Countdown,
    submission: SubmissionGate,
    ticker: Option<Ticker>,
}

impl Session {
    pub fn new(
        id: u64,
        student_id: u64,
        settings: TestSettings,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::source(format!(
                "no questions available for {} ({})",
                settings.subject.name, settings.difficulty
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id)) {
            return Err(QuizError::source(format!("duplicate question id {}", dup.id)));
        }

        let countdown = Countdown::new(settings.duration_secs());
        Ok(Self {
            id,
            student_id,
            settings,
            questions,
            answers: HashMap::new(),
            current: 0,
            countdown,
            submission: SubmissionGate::default(),
            ticker: None,
        })
    }

    /// Hand the periodic tick source to the session. It is cancelled when the
    /// countdown stops, when a result is stored, or when the session is dropped.
    pub fn attach_ticker(&mut self, ticker: Ticker) {
        self.ticker = Some(ticker);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn settings(&self) -> &TestSettings {
        &self.settings
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn answers(&self) -> &HashMap<QuestionId, String> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.questions
            .get(index)
            .is_some_and(|q| self.answers.contains_key(&q.id))
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn all_answered(&self) -> bool {
        self.answers.len() == self.questions.len()
    }

    pub fn progress_percent(&self) -> f64 {
        self.answers.len() as f64 / self.questions.len() as f64 * 100.0
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn is_expired(&self) -> bool {
        self.countdown.is_expired()
    }

    pub fn submission(&self) -> &SubmissionGate {
        &self.submission
    }

    /// Answers are frozen once time is up, while a submission is in flight
    /// and once stored. A retry after a failed submission resends exactly
    /// what was recorded.
    pub fn is_locked(&self) -> bool {
        !self.submission.is_idle() || self.countdown.is_expired()
    }

    /// Record or overwrite the answer for `question_id`. The option text is
    /// taken as given. Returns false for ids outside this session or while
    /// the session is locked.
    pub fn select_answer(&mut self, question_id: QuestionId, option: &str) -> bool {
        if self.is_locked() || !self.questions.iter().any(|q| q.id == question_id) {
            return false;
        }
        self.answers.insert(question_id, option.to_string());
        true
    }

    pub fn select_current(&mut self, option: &str) -> bool {
        let id = self.current_question().id;
        self.select_answer(id, option)
    }

    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Advance one question. Blocked while the current question is
    /// unanswered, and a no-op on the last question.
    pub fn next(&mut self) -> bool {
        if !self.is_answered(self.current) || self.current + 1 >= self.questions.len() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Jump straight to `index`, ignoring the answer gate that `next` applies.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.questions.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    pub fn can_finish(&self) -> bool {
        self.submission.is_idle() && (self.all_answered() || self.countdown.is_expired())
    }

    /// Advance the countdown by one second. On expiry the ticker is released;
    /// the caller is expected to call `begin_submission(TimerExpired)`.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.countdown.tick();
        if !matches!(outcome, TickOutcome::Running(_)) {
            self.stop_ticker();
        }
        outcome
    }

    /// Score the session and close the gate. Returns `None` when a call is
    /// already in flight or stored, or when a manual finish is not allowed yet.
    pub fn begin_submission(&mut self, trigger: FinishTrigger) -> Option<TestResult> {
        let allowed = match trigger {
            FinishTrigger::Manual => self.can_finish(),
            FinishTrigger::TimerExpired => self.countdown.is_expired(),
        };
        if !allowed || !self.submission.begin() {
            return None;
        }

        let time_spent = self
            .settings
            .duration_secs()
            .saturating_sub(self.countdown.remaining_secs());
        Some(TestResult::from_answers(
            &self.questions,
            &self.answers,
            self.student_id,
            self.settings.subject.id,
            self.settings.difficulty,
            time_spent,
        ))
    }

    /// Apply the result store's answer. A failure keeps every answer and
    /// re-opens the gate for another attempt.
    pub fn complete_submission(&mut self, outcome: Result<StoredResult, QuizError>) {
        self.submission.complete(outcome);
        if self.submission.is_submitted() {
            self.countdown.stop();
            self.stop_ticker();
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }
}
