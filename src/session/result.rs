use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::question::{Difficulty, Question, QuestionId};

/// Scored outcome of a finished session. Built once, at submission time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub student_id: u64,
    pub subject_id: u32,
    pub difficulty: Difficulty,
    pub correct_count: usize,
    pub total_count: usize,
    pub score_percent: f64,
    pub time_spent_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl TestResult {
    pub fn from_answers(
        questions: &[Question],
        answers: &HashMap<QuestionId, String>,
        student_id: u64,
        subject_id: u32,
        difficulty: Difficulty,
        time_spent_secs: u32,
    ) -> Self {
        let correct_count = correct_count(questions, answers);
        let total_count = questions.len();
        Self {
            student_id,
            subject_id,
            difficulty,
            correct_count,
            total_count,
            score_percent: score_percent(correct_count, total_count),
            time_spent_secs,
            created_at: Utc::now(),
        }
    }

    pub fn performance(&self) -> Performance {
        Performance::from_score(self.score_percent)
    }
}

/// A result as acknowledged by a result store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub result: TestResult,
}

/// Questions with no recorded answer count as wrong, never as an error.
pub fn correct_count(questions: &[Question], answers: &HashMap<QuestionId, String>) -> usize {
    questions
        .iter()
        .filter(|q| q.is_correct(answers.get(&q.id).map(String::as_str)))
        .count()
}

pub fn score_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Performance {
    Excellent,
    Good,
    NeedsImprovement,
}

impl Performance {
    pub fn from_score(score_percent: f64) -> Self {
        if score_percent >= 80.0 {
            Performance::Excellent
        } else if score_percent >= 60.0 {
            Performance::Good
        } else {
            Performance::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent",
            Performance::Good => "Good",
            Performance::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Performance::Excellent => "Great job! Keep up the good work.",
            Performance::Good => "You're doing well, but there's room for improvement.",
            Performance::NeedsImprovement => {
                "Don't worry, with more practice you can improve your score."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn math_questions() -> Vec<Question> {
        let correct = ["4", "50", "8", "3/4", "3.14"];
        correct
            .iter()
            .enumerate()
            .map(|(i, c)| Question::new(i as u64 + 1, "q", &[c, "other"], c))
            .collect()
    }

    fn answers(values: &[&str]) -> HashMap<QuestionId, String> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u64 + 1, v.to_string()))
            .collect()
    }

    #[test]
    fn test_all_correct_scores_full_marks() {
        let qs = math_questions();
        let result = TestResult::from_answers(
            &qs,
            &answers(&["4", "50", "8", "3/4", "3.14"]),
            1,
            1,
            Difficulty::Beginner,
            0,
        );
        assert_eq!(result.correct_count, 5);
        assert_eq!(result.total_count, 5);
        assert!((result.score_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_wrong_answer_scores_eighty() {
        let qs = math_questions();
        let result = TestResult::from_answers(
            &qs,
            &answers(&["3", "50", "8", "3/4", "3.14"]),
            1,
            1,
            Difficulty::Beginner,
            0,
        );
        assert_eq!(result.correct_count, 4);
        assert!((result.score_percent - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_answers_count_as_wrong() {
        let qs = math_questions();
        let partial = answers(&["4", "50"]);
        assert_eq!(correct_count(&qs, &partial), 2);
        assert_eq!(correct_count(&qs, &HashMap::new()), 0);
    }

    #[test]
    fn test_performance_bands() {
        assert_eq!(Performance::from_score(100.0), Performance::Excellent);
        assert_eq!(Performance::from_score(80.0), Performance::Excellent);
        assert_eq!(Performance::from_score(79.9), Performance::Good);
        assert_eq!(Performance::from_score(60.0), Performance::Good);
        assert_eq!(Performance::from_score(59.0), Performance::NeedsImprovement);
    }

    #[test]
    fn test_score_percent_of_empty_set_is_zero() {
        assert_eq!(score_percent(0, 0), 0.0);
    }
}
