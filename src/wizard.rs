use thiserror::Error;

use crate::session::question::{Difficulty, Subject};

pub const MIN_DURATION_MINUTES: u32 = 10;
pub const MAX_DURATION_MINUTES: u32 = 120;
pub const MIN_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 50;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("choose a subject")]
    MissingSubject,
    #[error("choose a difficulty")]
    MissingDifficulty,
    #[error(
        "duration must be between {min} and {max} minutes (got {0})",
        min = MIN_DURATION_MINUTES,
        max = MAX_DURATION_MINUTES
    )]
    DurationOutOfRange(u32),
    #[error(
        "question count must be between {min} and {max} (got {0})",
        min = MIN_QUESTION_COUNT,
        max = MAX_QUESTION_COUNT
    )]
    QuestionCountOutOfRange(usize),
    #[error("enter a name and a valid email address")]
    InvalidStudent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    Subject,
    Difficulty,
    Limits,
    Review,
    Student,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Subject,
        WizardStep::Difficulty,
        WizardStep::Limits,
        WizardStep::Review,
        WizardStep::Student,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::Subject => 0,
            WizardStep::Difficulty => 1,
            WizardStep::Limits => 2,
            WizardStep::Review => 3,
            WizardStep::Student => 4,
        }
    }

    /// `None` on the last step: the caller starts the test instead.
    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(self) -> WizardStep {
        Self::ALL[self.index().saturating_sub(1)]
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Subject => "Subject",
            WizardStep::Difficulty => "Difficulty",
            WizardStep::Limits => "Duration & Questions",
            WizardStep::Review => "Review Settings",
            WizardStep::Student => "Student",
        }
    }
}

/// The finalized, immutable configuration a session is created from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestSettings {
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub question_count: usize,
    pub student_name: String,
    pub student_email: String,
}

impl TestSettings {
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes * 60
    }
}

/// Wizard state carried from step to step. Each `with_*` call consumes the
/// draft and returns the updated one; nothing is shared or mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsDraft {
    pub subject: Option<Subject>,
    pub difficulty: Option<Difficulty>,
    pub duration_minutes: u32,
    pub question_count: usize,
    pub student_name: String,
    pub student_email: String,
}

impl Default for SettingsDraft {
    fn default() -> Self {
        Self {
            subject: None,
            difficulty: None,
            duration_minutes: 30,
            question_count: 10,
            student_name: String::new(),
            student_email: String::new(),
        }
    }
}

impl SettingsDraft {
    pub fn new(duration_minutes: u32, question_count: usize) -> Self {
        Self {
            duration_minutes,
            question_count,
            ..Self::default()
        }
    }

    pub fn with_subject(self, subject: Subject) -> Self {
        Self {
            subject: Some(subject),
            ..self
        }
    }

    pub fn with_difficulty(self, difficulty: Difficulty) -> Self {
        Self {
            difficulty: Some(difficulty),
            ..self
        }
    }

    pub fn with_duration(self, duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            ..self
        }
    }

    pub fn with_question_count(self, question_count: usize) -> Self {
        Self {
            question_count,
            ..self
        }
    }

    pub fn with_student(self, name: &str, email: &str) -> Self {
        Self {
            student_name: name.to_string(),
            student_email: email.to_string(),
            ..self
        }
    }

    pub fn step_valid(&self, step: WizardStep) -> bool {
        self.check_step(step).is_ok()
    }

    /// The first problem with `step`, if any.
    pub fn check_step(&self, step: WizardStep) -> Result<(), SettingsError> {
        match step {
            WizardStep::Subject => self
                .subject
                .as_ref()
                .map(|_| ())
                .ok_or(SettingsError::MissingSubject),
            WizardStep::Difficulty => self
                .difficulty
                .map(|_| ())
                .ok_or(SettingsError::MissingDifficulty),
            WizardStep::Limits => {
                if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes)
                {
                    return Err(SettingsError::DurationOutOfRange(self.duration_minutes));
                }
                if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&self.question_count) {
                    return Err(SettingsError::QuestionCountOutOfRange(self.question_count));
                }
                Ok(())
            }
            WizardStep::Review => Ok(()),
            WizardStep::Student => {
                let name = self.student_name.trim();
                let email = self.student_email.trim();
                if name.is_empty() || email.is_empty() || !email.contains('@') {
                    Err(SettingsError::InvalidStudent)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Validate every step and freeze the draft into `TestSettings`.
    pub fn finalize(&self) -> Result<TestSettings, SettingsError> {
        for step in WizardStep::ALL {
            self.check_step(step)?;
        }
        let (Some(subject), Some(difficulty)) = (self.subject.clone(), self.difficulty) else {
            return Err(SettingsError::MissingSubject);
        };
        Ok(TestSettings {
            subject,
            difficulty,
            duration_minutes: self.duration_minutes,
            question_count: self.question_count,
            student_name: self.student_name.trim().to_string(),
            student_email: self.student_email.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> SettingsDraft {
        SettingsDraft::default()
            .with_subject(Subject::new(1, "Mathematics"))
            .with_difficulty(Difficulty::Beginner)
            .with_student("Ada Lovelace", "ada@example.com")
    }

    #[test]
    fn test_steps_advance_in_order_and_stop_at_student() {
        assert_eq!(WizardStep::Subject.next(), Some(WizardStep::Difficulty));
        assert_eq!(WizardStep::Review.next(), Some(WizardStep::Student));
        assert_eq!(WizardStep::Student.next(), None);
        assert_eq!(WizardStep::Subject.prev(), WizardStep::Subject);
        assert_eq!(WizardStep::Limits.prev(), WizardStep::Difficulty);
    }

    #[test]
    fn test_empty_draft_blocks_first_two_steps() {
        let draft = SettingsDraft::default();
        assert!(!draft.step_valid(WizardStep::Subject));
        assert!(!draft.step_valid(WizardStep::Difficulty));
        assert!(draft.step_valid(WizardStep::Limits));
        assert!(draft.step_valid(WizardStep::Review));
        assert!(!draft.step_valid(WizardStep::Student));
    }

    #[test]
    fn test_limits_enforce_minimums() {
        let draft = complete_draft().with_duration(9);
        assert_eq!(draft.finalize(), Err(SettingsError::DurationOutOfRange(9)));
        let draft = complete_draft().with_question_count(4);
        assert_eq!(
            draft.finalize(),
            Err(SettingsError::QuestionCountOutOfRange(4))
        );
        let draft = complete_draft().with_duration(10).with_question_count(5);
        assert!(draft.step_valid(WizardStep::Limits));
    }

    #[test]
    fn test_student_requires_at_sign() {
        let draft = complete_draft().with_student("Ada", "ada.example.com");
        assert_eq!(draft.finalize(), Err(SettingsError::InvalidStudent));
        let draft = complete_draft().with_student("   ", "ada@example.com");
        assert_eq!(draft.finalize(), Err(SettingsError::InvalidStudent));
    }

    #[test]
    fn test_finalize_trims_and_freezes() {
        let settings = complete_draft()
            .with_student("  Ada  ", " ada@example.com ")
            .finalize()
            .unwrap();
        assert_eq!(settings.student_name, "Ada");
        assert_eq!(settings.student_email, "ada@example.com");
        assert_eq!(settings.duration_secs(), 1800);
        assert_eq!(settings.question_count, 10);
    }

    #[test]
    fn test_with_calls_leave_original_untouched() {
        let base = SettingsDraft::default();
        let changed = base.clone().with_duration(45);
        assert_eq!(base.duration_minutes, 30);
        assert_eq!(changed.duration_minutes, 45);
    }
}
