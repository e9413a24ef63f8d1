use serde::{Deserialize, Serialize};

use crate::session::result::StoredResult;
use crate::source::Student;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentsData {
    pub schema_version: u32,
    pub next_id: u64,
    pub students: Vec<Student>,
}

impl Default for StudentsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_id: 1,
            students: Vec::new(),
        }
    }
}

impl StudentsData {
    /// Existing record for `email`, compared case-insensitively.
    pub fn find_by_email(&self, email: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.email.eq_ignore_ascii_case(email))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultHistoryData {
    pub schema_version: u32,
    pub next_id: u64,
    pub results: Vec<StoredResult>,
}

impl Default for ResultHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_id: 1,
            results: Vec::new(),
        }
    }
}

impl ResultHistoryData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
