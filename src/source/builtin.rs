use crate::error::QuizError;
use crate::session::question::{Difficulty, Question, Subject};
use crate::source::QuestionSource;

struct BankEntry {
    prompt: &'static str,
    options: [&'static str; 4],
    correct: &'static str,
}

struct Bank {
    subject_id: u32,
    name: &'static str,
    entries: &'static [BankEntry],
}

const MATH: &[BankEntry] = &[
    BankEntry {
        prompt: "What is 2 + 2?",
        options: ["3", "4", "5", "6"],
        correct: "4",
    },
    BankEntry {
        prompt: "What is 10 * 5?",
        options: ["40", "45", "50", "55"],
        correct: "50",
    },
    BankEntry {
        prompt: "What is the square root of 64?",
        options: ["6", "7", "8", "9"],
        correct: "8",
    },
    BankEntry {
        prompt: "What is 1/4 + 1/2?",
        options: ["1/6", "2/6", "3/4", "5/4"],
        correct: "3/4",
    },
    BankEntry {
        prompt: "What is the value of \u{3c0} (pi) to two decimal places?",
        options: ["3.14", "3.16", "3.18", "3.20"],
        correct: "3.14",
    },
];

const SCIENCE: &[BankEntry] = &[
    BankEntry {
        prompt: "What is the chemical symbol for water?",
        options: ["H2O", "CO2", "NaCl", "O2"],
        correct: "H2O",
    },
    BankEntry {
        prompt: "Which planet is known as the Red Planet?",
        options: ["Mars", "Venus", "Jupiter", "Saturn"],
        correct: "Mars",
    },
    BankEntry {
        prompt: "What is the largest organ in the human body?",
        options: ["Heart", "Brain", "Liver", "Skin"],
        correct: "Skin",
    },
    BankEntry {
        prompt: "What is the process by which plants make their own food?",
        options: ["Photosynthesis", "Respiration", "Fermentation", "Digestion"],
        correct: "Photosynthesis",
    },
    BankEntry {
        prompt: "What is the smallest unit of matter?",
        options: ["Atom", "Molecule", "Cell", "Particle"],
        correct: "Atom",
    },
];

const HISTORY: &[BankEntry] = &[
    BankEntry {
        prompt: "Who was the first President of the United States?",
        options: [
            "John Adams",
            "Thomas Jefferson",
            "George Washington",
            "Benjamin Franklin",
        ],
        correct: "George Washington",
    },
    BankEntry {
        prompt: "In which year did World War II end?",
        options: ["1943", "1944", "1945", "1946"],
        correct: "1945",
    },
    BankEntry {
        prompt: "Who wrote the Declaration of Independence?",
        options: [
            "George Washington",
            "Thomas Jefferson",
            "Benjamin Franklin",
            "John Adams",
        ],
        correct: "Thomas Jefferson",
    },
    BankEntry {
        prompt: "What ancient wonder was located in Alexandria, Egypt?",
        options: [
            "The Hanging Gardens",
            "The Colossus of Rhodes",
            "The Lighthouse",
            "The Great Pyramid",
        ],
        correct: "The Lighthouse",
    },
    BankEntry {
        prompt: "Who was the first woman to fly solo across the Atlantic Ocean?",
        options: [
            "Amelia Earhart",
            "Bessie Coleman",
            "Harriet Quimby",
            "Jacqueline Cochran",
        ],
        correct: "Amelia Earhart",
    },
];

const BANKS: &[Bank] = &[
    Bank {
        subject_id: 1,
        name: "Mathematics",
        entries: MATH,
    },
    Bank {
        subject_id: 2,
        name: "Science",
        entries: SCIENCE,
    },
    Bank {
        subject_id: 3,
        name: "History",
        entries: HISTORY,
    },
];

/// Offline question tables. Difficulty does not filter the tables; every
/// level gets the same questions.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinSource;

impl BuiltinSource {
    pub fn new() -> Self {
        Self
    }
}

impl QuestionSource for BuiltinSource {
    fn subjects(&self) -> Result<Vec<Subject>, QuizError> {
        Ok(BANKS
            .iter()
            .map(|b| Subject::new(b.subject_id, b.name))
            .collect())
    }

    fn fetch_questions(
        &self,
        subject_id: u32,
        _difficulty: Difficulty,
    ) -> Result<Vec<Question>, QuizError> {
        let bank = BANKS
            .iter()
            .find(|b| b.subject_id == subject_id)
            .ok_or_else(|| QuizError::source(format!("no built-in questions for subject {subject_id}")))?;

        Ok(bank
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| Question::new(i as u64 + 1, e.prompt, &e.options, e.correct))
            .collect())
    }
}
