pub mod history;
pub mod question;
pub mod result;
pub mod state;
pub mod submit;
pub mod timer;

pub use question::{Difficulty, Question, QuestionId, Subject};
pub use result::{StoredResult, TestResult};
pub use state::Session;
pub use submit::FinishTrigger;
