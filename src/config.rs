use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::wizard::{
    MAX_DURATION_MINUTES, MAX_QUESTION_COUNT, MIN_DURATION_MINUTES, MIN_QUESTION_COUNT,
};

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 120;

/// Where questions come from and where results go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The quiz REST API.
    #[default]
    Remote,
    /// Built-in question tables with results kept on disk.
    Local,
}

impl Backend {
    pub fn toggle(self) -> Self {
        match self {
            Backend::Remote => Backend::Local,
            Backend::Local => Backend::Remote,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Remote => write!(f, "remote"),
            Backend::Local => write!(f, "local"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_email: String,
    #[serde(default)]
    pub student_id: Option<u64>,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_api_url() -> String {
    "http://localhost:4506".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_duration_minutes() -> u32 {
    30
}
fn default_question_count() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            backend: Backend::default(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            duration_minutes: default_duration_minutes(),
            question_count: default_question_count(),
            shuffle_questions: false,
            student_name: String::new(),
            student_email: String::new(),
            student_id: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizr")
            .join("config.toml")
    }

    /// Clamp numeric fields into range and reset an unknown theme.
    /// Call after deserialization and after applying CLI overrides.
    pub fn validate(&mut self, valid_themes: &[String]) {
        self.duration_minutes = self
            .duration_minutes
            .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
        self.question_count = self
            .question_count
            .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);
        self.request_timeout_secs = self
            .request_timeout_secs
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        if !valid_themes.is_empty() && !valid_themes.contains(&self.theme) {
            log::warn!("unknown theme {:?}, using default", self.theme);
            self.theme = default_theme();
        }
        if self.api_url.trim().is_empty() {
            self.api_url = default_api_url();
        }
    }

    /// Remember the registered student so the next run can prefill the
    /// wizard and open history from the menu.
    pub fn remember_student(&mut self, id: u64, full_name: &str, email: &str) {
        self.student_id = Some(id);
        self.student_name = full_name.to_string();
        self.student_email = email.to_string();
    }
}
