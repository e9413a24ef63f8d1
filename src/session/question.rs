use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type QuestionId = u64;

/// A multiple-choice question. The correct answer is stored as the literal
/// option text, not as an index into `options`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

impl Question {
    pub fn new(id: QuestionId, prompt: &str, options: &[&str], correct_option: &str) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option: correct_option.to_string(),
        }
    }

    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer == Some(self.correct_option.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u32,
    pub name: String,
}

impl Subject {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    /// Path segment used by the remote API.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Basic concepts and simple questions",
            Difficulty::Intermediate => "Moderate difficulty with some challenges",
            Difficulty::Advanced => "Complex problems and advanced concepts",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_answer_is_incorrect() {
        let q = Question::new(1, "What is 2 + 2?", &["3", "4", "5", "6"], "4");
        assert!(!q.is_correct(None));
        assert!(!q.is_correct(Some("5")));
        assert!(q.is_correct(Some("4")));
    }

    #[test]
    fn test_difficulty_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert_eq!(" beginner ".parse::<Difficulty>(), Ok(Difficulty::Beginner));
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_difficulty_serializes_lowercase() {
        let json = serde_json::to_string(&Difficulty::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");
    }
}
