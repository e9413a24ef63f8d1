use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::QuizError;
use crate::session::result::{StoredResult, TestResult};
use crate::source::{ResultStore, Student};
use crate::store::schema::{ResultHistoryData, StudentsData};

const STUDENTS_FILE: &str = "students.json";
const RESULTS_FILE: &str = "results.json";

/// Offline result store: students and results as pretty JSON under the data
/// directory.
pub struct JsonStore {
    base_dir: PathBuf,
    // Serializes read-modify-write cycles between worker threads.
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizr");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            lock: Mutex::new(()),
        })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("{} is unreadable, starting fresh: {e}", path.display());
                T::default()
            }),
            Err(e) => {
                log::warn!("cannot read {}: {e}", path.display());
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_students(&self) -> StudentsData {
        self.load(STUDENTS_FILE)
    }

    pub fn load_results(&self) -> ResultHistoryData {
        let data: ResultHistoryData = self.load(RESULTS_FILE);
        if data.needs_reset() {
            log::warn!(
                "discarding result history with schema version {}",
                data.schema_version
            );
            return ResultHistoryData::default();
        }
        data
    }

    fn add_student(&self, full_name: &str, email: &str) -> Result<Student> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut data = self.load_students();
        if let Some(existing) = data.find_by_email(email) {
            return Ok(existing.clone());
        }
        let student = Student {
            id: data.next_id,
            full_name: full_name.to_string(),
            email: email.to_string(),
        };
        data.next_id += 1;
        data.students.push(student.clone());
        self.save(STUDENTS_FILE, &data)?;
        Ok(student)
    }

    fn append_result(&self, result: &TestResult) -> Result<StoredResult> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut data = self.load_results();
        let created_at = Utc::now();
        let stored = StoredResult {
            id: data.next_id,
            created_at,
            result: TestResult {
                created_at,
                ..result.clone()
            },
        };
        data.next_id += 1;
        data.results.push(stored.clone());
        self.save(RESULTS_FILE, &data)?;
        Ok(stored)
    }
}

impl ResultStore for JsonStore {
    fn register_student(&self, full_name: &str, email: &str) -> Result<Student, QuizError> {
        self.add_student(full_name, email)
            .map_err(|e| QuizError::submission(format!("cannot save student: {e}")))
    }

    fn submit_result(&self, result: &TestResult) -> Result<StoredResult, QuizError> {
        self.append_result(result)
            .map_err(|e| QuizError::submission(format!("cannot save result: {e}")))
    }

    fn fetch_history(&self, student_id: u64) -> Result<Vec<StoredResult>, QuizError> {
        Ok(self
            .load_results()
            .results
            .into_iter()
            .filter(|r| r.result.student_id == student_id)
            .collect())
    }
}
