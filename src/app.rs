use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use quizr::config::{Backend, Config};
use quizr::error::QuizError;
use quizr::session::history::{HistoryComparison, sort_newest_first};
use quizr::session::timer::{TickOutcome, Ticker};
use quizr::session::{Difficulty, FinishTrigger, Question, Session, StoredResult, Subject};
use quizr::source::builtin::BuiltinSource;
use quizr::source::{QuestionSource, ResultStore, Student, prepare_questions};
use quizr::store::json_store::JsonStore;
use quizr::wizard::{
    MAX_DURATION_MINUTES, MAX_QUESTION_COUNT, MIN_DURATION_MINUTES, MIN_QUESTION_COUNT,
    SettingsDraft, TestSettings, WizardStep,
};

use crate::event::{AppEvent, Response};
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Wizard,
    Loading,
    Test,
    TestResult,
    History,
    Settings,
}

/// Modal layered over the test screen.
pub enum TestOverlay {
    None,
    ConfirmFinish,
    ConfirmAbandon,
    Jump(LineInput),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudentField {
    Name,
    Email,
}

pub struct WizardState {
    pub step: WizardStep,
    pub draft: SettingsDraft,
    pub subjects: Vec<Subject>,
    pub subjects_loading: bool,
    /// Highlighted row on the subject and difficulty steps.
    pub cursor: usize,
    /// 0 = duration, 1 = question count.
    pub limits_field: usize,
    pub name_input: LineInput,
    pub email_input: LineInput,
    pub student_field: StudentField,
    pub error: Option<String>,
}

impl WizardState {
    fn new(config: &Config) -> Self {
        let draft = SettingsDraft::new(config.duration_minutes, config.question_count)
            .with_student(&config.student_name, &config.student_email);
        Self {
            step: WizardStep::Subject,
            draft,
            subjects: Vec::new(),
            subjects_loading: true,
            cursor: 0,
            limits_field: 0,
            name_input: LineInput::new(&config.student_name),
            email_input: LineInput::new(&config.student_email),
            student_field: StudentField::Name,
            error: None,
        }
    }

    fn go_to(&mut self, step: WizardStep) {
        self.step = step;
        self.cursor = match step {
            WizardStep::Subject => self
                .draft
                .subject
                .as_ref()
                .and_then(|s| self.subjects.iter().position(|x| x.id == s.id))
                .unwrap_or(0),
            WizardStep::Difficulty => self
                .draft
                .difficulty
                .and_then(|d| Difficulty::ALL.iter().position(|x| *x == d))
                .unwrap_or(0),
            _ => 0,
        };
    }
}

pub const SETTINGS_FIELDS: usize = 7;

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub wizard: WizardState,
    pub session: Option<Session>,
    pub option_cursor: usize,
    pub overlay: TestOverlay,
    pub status: Option<String>,
    pub last_settings: Option<TestSettings>,
    pub last_result: Option<StoredResult>,
    pub comparison: Option<HistoryComparison>,
    pub history: Vec<StoredResult>,
    pub history_loading: bool,
    pub history_error: Option<String>,
    pub history_selected: usize,
    pub settings_selected: usize,
    pub settings_editing: Option<LineInput>,
    pub should_quit: bool,
    /// Write config changes to disk.
    persist_config: bool,
    source: Arc<dyn QuestionSource>,
    store: Arc<dyn ResultStore>,
    tx: Sender<AppEvent>,
    next_session_id: u64,
    next_request_id: u64,
    pending_start: Option<u64>,
    pending_subjects: Option<u64>,
    rng: SmallRng,
}

/// Pick the question source and result store for `config.backend`.
pub fn build_backends(config: &Config) -> Result<(Arc<dyn QuestionSource>, Arc<dyn ResultStore>)> {
    match config.backend {
        #[cfg(feature = "network")]
        Backend::Remote => {
            let client = Arc::new(quizr::source::remote::ApiClient::new(
                &config.api_url,
                Duration::from_secs(config.request_timeout_secs),
            )?);
            log::info!("using quiz API at {}", client.base_url());
            let source: Arc<dyn QuestionSource> = client.clone();
            let store: Arc<dyn ResultStore> = client;
            Ok((source, store))
        }
        #[cfg(not(feature = "network"))]
        Backend::Remote => {
            log::warn!("built without network support, falling back to the local backend");
            local_backends()
        }
        Backend::Local => {
            log::info!("using built-in questions with the local result store");
            local_backends()
        }
    }
}

fn local_backends() -> Result<(Arc<dyn QuestionSource>, Arc<dyn ResultStore>)> {
    let source: Arc<dyn QuestionSource> = Arc::new(BuiltinSource::new());
    let store: Arc<dyn ResultStore> = Arc::new(JsonStore::new()?);
    Ok((source, store))
}

impl App {
    pub fn new(
        config: Config,
        theme: &'static Theme,
        source: Arc<dyn QuestionSource>,
        store: Arc<dyn ResultStore>,
        tx: Sender<AppEvent>,
    ) -> Self {
        let wizard = WizardState::new(&config);
        Self {
            screen: AppScreen::Menu,
            menu: Menu::new(theme),
            theme,
            config,
            wizard,
            session: None,
            option_cursor: 0,
            overlay: TestOverlay::None,
            status: None,
            last_settings: None,
            last_result: None,
            comparison: None,
            history: Vec::new(),
            history_loading: false,
            history_error: None,
            history_selected: 0,
            settings_selected: 0,
            settings_editing: None,
            should_quit: false,
            persist_config: true,
            source,
            store,
            tx,
            next_session_id: 1,
            next_request_id: 1,
            pending_start: None,
            pending_subjects: None,
            rng: SmallRng::from_entropy(),
        }
    }

    fn save_config(&self) {
        if !self.persist_config {
            return;
        }
        if let Err(e) = self.config.save() {
            log::warn!("failed to save config: {e}");
        }
    }

    /// Run `job` on a worker thread and post its response to the event loop.
    fn spawn_request<F>(&self, job: F)
    where
        F: FnOnce() -> Response + Send + 'static,
    {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(AppEvent::Response(job()));
        });
    }

    pub fn run_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::StartTest => self.open_wizard(),
            MenuAction::History => self.go_to_history(),
            MenuAction::Settings => self.go_to_settings(),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    pub fn go_to_menu(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.submission().is_submitted() {
                log::info!(
                    "session {} abandoned with {}/{} answered",
                    session.id(),
                    session.answered_count(),
                    session.len()
                );
            }
        }
        self.pending_start = None;
        self.overlay = TestOverlay::None;
        self.status = None;
        self.screen = AppScreen::Menu;
    }

    // ---- wizard ----

    pub fn open_wizard(&mut self) {
        self.wizard = WizardState::new(&self.config);
        self.screen = AppScreen::Wizard;
        let request = self.next_request_id;
        self.next_request_id += 1;
        self.pending_subjects = Some(request);
        let source = Arc::clone(&self.source);
        self.spawn_request(move || Response::Subjects {
            request,
            outcome: source.subjects(),
        });
    }

    fn on_subjects(&mut self, request: u64, outcome: Result<Vec<Subject>, QuizError>) {
        if self.pending_subjects != Some(request) {
            log::debug!("dropping stale subject list {request}");
            return;
        }
        self.pending_subjects = None;
        self.wizard.subjects_loading = false;
        match outcome {
            Ok(subjects) => {
                self.wizard.subjects = subjects;
                self.wizard.cursor = 0;
            }
            Err(err) => {
                log::warn!("subject list unavailable: {err}");
                self.wizard.error = Some(capitalize(&err.to_string()));
            }
        }
    }

    pub fn wizard_move(&mut self, down: bool) {
        let w = &mut self.wizard;
        match w.step {
            WizardStep::Subject | WizardStep::Difficulty => {
                let len = if w.step == WizardStep::Subject {
                    w.subjects.len()
                } else {
                    Difficulty::ALL.len()
                };
                if len == 0 {
                    return;
                }
                w.cursor = if down {
                    (w.cursor + 1) % len
                } else {
                    w.cursor.checked_sub(1).unwrap_or(len - 1)
                };
            }
            WizardStep::Limits => w.limits_field = 1 - w.limits_field.min(1),
            WizardStep::Student => {
                w.student_field = match w.student_field {
                    StudentField::Name => StudentField::Email,
                    StudentField::Email => StudentField::Name,
                };
            }
            WizardStep::Review => {}
        }
    }

    /// Adjust the highlighted limit on the limits step.
    pub fn wizard_adjust(&mut self, increase: bool) {
        let w = &mut self.wizard;
        if w.step != WizardStep::Limits {
            return;
        }
        let draft = std::mem::take(&mut w.draft);
        w.draft = if w.limits_field == 0 {
            let d = draft.duration_minutes;
            let d = if increase { d.saturating_add(5) } else { d.saturating_sub(5) };
            draft.with_duration(d.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES))
        } else {
            let c = draft.question_count;
            let c = if increase { c.saturating_add(1) } else { c.saturating_sub(1) };
            draft.with_question_count(c.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT))
        };
    }

    /// Commit the current step and move on; on the last step, start the test.
    pub fn wizard_confirm(&mut self) {
        let w = &mut self.wizard;
        w.error = None;
        let draft = std::mem::take(&mut w.draft);
        w.draft = match w.step {
            WizardStep::Subject => match w.subjects.get(w.cursor) {
                Some(subject) => draft.with_subject(subject.clone()),
                None => draft,
            },
            WizardStep::Difficulty => draft.with_difficulty(Difficulty::ALL[w.cursor]),
            WizardStep::Student => {
                draft.with_student(w.name_input.value(), w.email_input.value())
            }
            WizardStep::Limits | WizardStep::Review => draft,
        };

        if let Err(e) = w.draft.check_step(w.step) {
            w.error = Some(if w.step == WizardStep::Subject && w.subjects.is_empty() {
                "No subjects available".to_string()
            } else {
                capitalize(&e.to_string())
            });
            return;
        }

        if let Some(step) = w.step.next() {
            w.go_to(step);
            return;
        }
        match self.wizard.draft.finalize() {
            Ok(settings) => self.start_test(settings),
            Err(e) => self.wizard.error = Some(capitalize(&e.to_string())),
        }
    }

    pub fn wizard_back(&mut self) {
        if self.wizard.step == WizardStep::Subject {
            self.go_to_menu();
        } else {
            let prev = self.wizard.step.prev();
            self.wizard.error = None;
            self.wizard.go_to(prev);
        }
    }

    pub fn wizard_student_key(&mut self, key: crossterm::event::KeyEvent) {
        let w = &mut self.wizard;
        let input = match w.student_field {
            StudentField::Name => &mut w.name_input,
            StudentField::Email => &mut w.email_input,
        };
        match input.handle(key) {
            InputResult::Continue => {}
            InputResult::Submit => self.wizard_confirm(),
            InputResult::Cancel => self.wizard_back(),
        }
    }

    // ---- session lifecycle ----

    fn start_test(&mut self, settings: TestSettings) {
        let request = self.next_request_id;
        self.next_request_id += 1;
        self.pending_start = Some(request);
        self.screen = AppScreen::Loading;
        log::info!(
            "starting {} ({}) with {} questions, {} minutes",
            settings.subject.name,
            settings.difficulty,
            settings.question_count,
            settings.duration_minutes
        );

        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let shuffle_seed = self.config.shuffle_questions.then(|| self.rng.r#gen::<u64>());
        self.spawn_request(move || {
            let outcome = prepare_test(source.as_ref(), store.as_ref(), &settings, shuffle_seed);
            Response::Prepared {
                request,
                settings,
                outcome,
            }
        });
    }

    pub fn cancel_loading(&mut self) {
        self.pending_start = None;
        self.screen = AppScreen::Wizard;
    }

    fn on_prepared(
        &mut self,
        request: u64,
        settings: TestSettings,
        outcome: Result<(Student, Vec<Question>), QuizError>,
    ) {
        if self.pending_start != Some(request) {
            log::debug!("dropping stale start response {request}");
            return;
        }
        self.pending_start = None;

        let (student, questions) = match outcome {
            Ok(prepared) => prepared,
            Err(err) => {
                log::warn!("could not start test: {err}");
                self.screen = AppScreen::Wizard;
                // Registration problems are fixed on the student step; a
                // missing question set sends the user back to review.
                let step = if err.is_retryable() {
                    WizardStep::Student
                } else {
                    WizardStep::Review
                };
                self.wizard.go_to(step);
                self.wizard.error = Some(capitalize(&err.to_string()));
                return;
            }
        };

        self.config
            .remember_student(student.id, &student.full_name, &student.email);
        self.save_config();

        let session_id = self.next_session_id;
        self.next_session_id += 1;
        match Session::new(session_id, student.id, settings.clone(), questions) {
            Ok(mut session) => {
                let tx = self.tx.clone();
                session.attach_ticker(Ticker::spawn(Duration::from_secs(1), tx, move || {
                    AppEvent::Second { session_id }
                }));
                log::info!("session {session_id} started with {} questions", session.len());
                self.session = Some(session);
                self.last_settings = Some(settings);
                self.option_cursor = 0;
                self.overlay = TestOverlay::None;
                self.status = None;
                self.screen = AppScreen::Test;
            }
            Err(err) => {
                log::warn!("rejected question set: {err}");
                self.screen = AppScreen::Wizard;
                self.wizard.go_to(WizardStep::Review);
                self.wizard.error = Some(capitalize(&err.to_string()));
            }
        }
    }

    pub fn on_second(&mut self, session_id: u64) {
        let Some(session) = self.session.as_mut().filter(|s| s.id() == session_id) else {
            return;
        };
        if session.tick() == TickOutcome::Expired {
            log::info!("session {session_id} timed out");
            self.overlay = TestOverlay::None;
            self.status = Some("Time is up. Submitting your answers...".to_string());
            self.submit(FinishTrigger::TimerExpired);
        }
    }

    fn submit(&mut self, trigger: FinishTrigger) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(result) = session.begin_submission(trigger) else {
            log::debug!("submission for session {} not started", session.id());
            return;
        };
        let session_id = session.id();
        log::info!(
            "submitting session {session_id}: {}/{} correct",
            result.correct_count,
            result.total_count
        );
        let store = Arc::clone(&self.store);
        self.spawn_request(move || Response::Submitted {
            session_id,
            outcome: store.submit_result(&result),
        });
    }

    fn on_submitted(&mut self, session_id: u64, outcome: Result<StoredResult, QuizError>) {
        let Some(session) = self.session.as_mut().filter(|s| s.id() == session_id) else {
            return;
        };
        session.complete_submission(outcome.clone());
        match outcome {
            Ok(stored) => {
                log::info!("session {session_id} stored as result {}", stored.id);
                self.last_result = Some(stored);
                self.comparison = None;
                self.session = None;
                self.overlay = TestOverlay::None;
                self.status = None;
                self.screen = AppScreen::TestResult;
                self.request_history();
            }
            Err(err) => {
                log::warn!("submission of session {session_id} failed: {err}");
                self.status = Some(format!("{}. Press [f] to retry.", capitalize(&err.to_string())));
            }
        }
    }

    // ---- test screen ----

    fn sync_option_cursor(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let q = session.current_question();
        self.option_cursor = session
            .answer_for(q.id)
            .and_then(|a| q.options.iter().position(|o| o == a))
            .unwrap_or(0);
    }

    pub fn move_option_cursor(&mut self, down: bool) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let len = session.current_question().options.len();
        if len == 0 {
            return;
        }
        self.option_cursor = if down {
            (self.option_cursor + 1) % len
        } else {
            self.option_cursor.checked_sub(1).unwrap_or(len - 1)
        };
    }

    /// Record the option at `index`, or the highlighted one when `None`.
    pub fn choose_option(&mut self, index: Option<usize>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let idx = index.unwrap_or(self.option_cursor);
        let Some(option) = session.current_question().options.get(idx).cloned() else {
            return;
        };
        if session.select_current(&option) {
            self.option_cursor = idx;
            self.status = None;
        } else if session.is_expired() {
            self.status = Some("Time is up, answers can no longer change".to_string());
        } else if session.is_locked() {
            self.status = Some("Answers are locked while the result is being saved".to_string());
        }
    }

    pub fn previous_question(&mut self) {
        if self.session.as_mut().is_some_and(|s| s.previous()) {
            self.sync_option_cursor();
        }
    }

    pub fn next_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.next() {
            self.sync_option_cursor();
            self.status = None;
        } else if !session.is_answered(session.current_index()) {
            self.status = Some("Answer this question before moving on".to_string());
        }
    }

    pub fn open_jump(&mut self) {
        if self.session.is_some() {
            self.overlay = TestOverlay::Jump(LineInput::numeric(3));
        }
    }

    pub fn jump_key(&mut self, key: crossterm::event::KeyEvent) {
        let TestOverlay::Jump(input) = &mut self.overlay else {
            return;
        };
        match input.handle(key) {
            InputResult::Continue => {}
            InputResult::Cancel => self.overlay = TestOverlay::None,
            InputResult::Submit => {
                let target = input.value().parse::<usize>().ok();
                self.overlay = TestOverlay::None;
                let jumped = match (target, self.session.as_mut()) {
                    (Some(n), Some(session)) if n >= 1 => session.jump_to(n - 1),
                    _ => false,
                };
                if jumped {
                    self.sync_option_cursor();
                    self.status = None;
                } else {
                    self.status = Some("No such question".to_string());
                }
            }
        }
    }

    pub fn request_finish(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.submission().is_pending() {
            self.status = Some("Submission in progress...".to_string());
        } else if session.can_finish() {
            self.overlay = TestOverlay::ConfirmFinish;
        } else {
            let left = session.len() - session.answered_count();
            self.status = Some(format!(
                "{left} question{} still unanswered",
                if left == 1 { "" } else { "s" }
            ));
        }
    }

    /// Ask before leaving the test. Refused while a result is being saved,
    /// since the store may still accept it.
    pub fn request_abandon(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.submission().is_pending() {
            self.overlay = TestOverlay::None;
            self.status = Some("Submission in progress...".to_string());
        } else {
            self.overlay = TestOverlay::ConfirmAbandon;
        }
    }

    pub fn confirm_abandon(&mut self) {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.submission().is_pending())
        {
            self.request_abandon();
            return;
        }
        self.go_to_menu();
    }

    pub fn confirm_finish(&mut self) {
        self.overlay = TestOverlay::None;
        self.submit(FinishTrigger::Manual);
    }

    // ---- history ----

    pub fn go_to_history(&mut self) {
        self.history_selected = 0;
        self.screen = AppScreen::History;
        if self.config.student_id.is_none() {
            self.history.clear();
            self.history_error = Some("Take a test first to build a history".to_string());
            return;
        }
        self.request_history();
    }

    pub fn request_history(&mut self) {
        let Some(student_id) = self.config.student_id else {
            return;
        };
        self.history_loading = true;
        self.history_error = None;
        let store = Arc::clone(&self.store);
        self.spawn_request(move || Response::History(store.fetch_history(student_id)));
    }

    fn on_history(&mut self, outcome: Result<Vec<StoredResult>, QuizError>) {
        self.history_loading = false;
        match outcome {
            Ok(mut results) => {
                sort_newest_first(&mut results);
                if let Some(current) = self.last_result.as_ref() {
                    self.comparison = Some(HistoryComparison::compute(current, &results));
                }
                self.history_selected = self.history_selected.min(results.len().saturating_sub(1));
                self.history = results;
            }
            Err(err) => {
                log::warn!("history fetch failed: {err}");
                self.history_error = Some(capitalize(&err.to_string()));
            }
        }
    }

    pub fn subject_name(&self, subject_id: u32) -> String {
        self.wizard
            .subjects
            .iter()
            .find(|s| s.id == subject_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Subject {subject_id}"))
    }

    // ---- settings ----

    pub fn go_to_settings(&mut self) {
        self.settings_selected = 0;
        self.settings_editing = None;
        self.screen = AppScreen::Settings;
    }

    pub fn settings_cycle_forward(&mut self) {
        self.settings_step(true);
    }

    pub fn settings_cycle_backward(&mut self) {
        self.settings_step(false);
    }

    fn settings_step(&mut self, forward: bool) {
        let c = &mut self.config;
        match self.settings_selected {
            0 => {
                let themes = Theme::available_themes();
                if themes.is_empty() {
                    return;
                }
                let idx = themes.iter().position(|t| *t == c.theme).unwrap_or(0);
                let next = if forward {
                    (idx + 1) % themes.len()
                } else {
                    idx.checked_sub(1).unwrap_or(themes.len() - 1)
                };
                c.theme = themes[next].clone();
                if let Some(new_theme) = Theme::load(&c.theme) {
                    let theme: &'static Theme = Box::leak(Box::new(new_theme));
                    self.theme = theme;
                    self.menu.theme = theme;
                }
            }
            1 => {
                c.backend = c.backend.toggle();
                // Student ids are only meaningful to the store that issued them.
                c.student_id = None;
            }
            2 => self.settings_editing = Some(LineInput::new(&c.api_url)),
            3 => {
                c.duration_minutes = if forward {
                    c.duration_minutes.saturating_add(5)
                } else {
                    c.duration_minutes.saturating_sub(5)
                }
                .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
            }
            4 => {
                c.question_count = if forward {
                    c.question_count.saturating_add(1)
                } else {
                    c.question_count.saturating_sub(1)
                }
                .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);
            }
            5 => c.shuffle_questions = !c.shuffle_questions,
            6 => {
                c.request_timeout_secs = if forward {
                    c.request_timeout_secs.saturating_add(1)
                } else {
                    c.request_timeout_secs.saturating_sub(1)
                }
                .clamp(1, 120);
            }
            _ => {}
        }
    }

    pub fn settings_edit_key(&mut self, key: crossterm::event::KeyEvent) {
        let Some(input) = self.settings_editing.as_mut() else {
            return;
        };
        match input.handle(key) {
            InputResult::Continue => {}
            InputResult::Cancel => self.settings_editing = None,
            InputResult::Submit => {
                let url = input.value().trim().to_string();
                if !url.is_empty() {
                    self.config.api_url = url;
                }
                self.settings_editing = None;
            }
        }
    }

    /// Persist the settings and rebuild the backends they select.
    pub fn leave_settings(&mut self) {
        self.config.validate(&Theme::available_themes());
        self.save_config();
        match build_backends(&self.config) {
            Ok((source, store)) => {
                self.source = source;
                self.store = store;
            }
            Err(e) => log::error!("cannot switch backend: {e:#}"),
        }
        self.go_to_menu();
    }

    // ---- event dispatch ----

    pub fn handle_response(&mut self, response: Response) {
        match response {
            Response::Subjects { request, outcome } => self.on_subjects(request, outcome),
            Response::Prepared {
                request,
                settings,
                outcome,
            } => self.on_prepared(request, settings, outcome),
            Response::Submitted {
                session_id,
                outcome,
            } => self.on_submitted(session_id, outcome),
            Response::History(outcome) => self.on_history(outcome),
        }
    }
}

/// Register the student, then fetch and trim the question list.
fn prepare_test(
    source: &dyn QuestionSource,
    store: &dyn ResultStore,
    settings: &TestSettings,
    shuffle_seed: Option<u64>,
) -> Result<(Student, Vec<Question>), QuizError> {
    let student = store.register_student(&settings.student_name, &settings.student_email)?;
    let questions = source.fetch_questions(settings.subject.id, settings.difficulty)?;
    let mut rng = shuffle_seed.map(SmallRng::seed_from_u64);
    let questions = prepare_questions(questions, settings.question_count, rng.as_mut())?;
    Ok((student, questions))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    struct FailingStore;

    impl ResultStore for FailingStore {
        fn register_student(&self, _: &str, _: &str) -> Result<Student, QuizError> {
            Err(QuizError::submission("offline"))
        }
        fn submit_result(
            &self,
            _: &quizr::session::TestResult,
        ) -> Result<StoredResult, QuizError> {
            Err(QuizError::submission("offline"))
        }
        fn fetch_history(&self, _: u64) -> Result<Vec<StoredResult>, QuizError> {
            Ok(Vec::new())
        }
    }

    fn settings() -> TestSettings {
        SettingsDraft::default()
            .with_subject(Subject::new(1, "Mathematics"))
            .with_difficulty(Difficulty::Beginner)
            .with_question_count(5)
            .with_student("Ada", "ada@example.com")
            .finalize()
            .unwrap()
    }

    fn test_app() -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let mut app = App::new(
            Config::default(),
            theme,
            Arc::new(BuiltinSource::new()),
            Arc::new(FailingStore),
            tx,
        );
        app.persist_config = false;
        (app, rx)
    }

    fn start_session(app: &mut App) {
        let questions = BuiltinSource::new()
            .fetch_questions(1, Difficulty::Beginner)
            .unwrap();
        app.pending_start = Some(7);
        let student = Student {
            id: 3,
            full_name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        app.on_prepared(7, settings(), Ok((student, questions)));
    }

    #[test]
    fn test_prepare_test_registration_failure_is_retryable() {
        let err = prepare_test(&BuiltinSource::new(), &FailingStore, &settings(), None).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_stale_start_response_is_ignored() {
        let (mut app, _rx) = test_app();
        app.pending_start = Some(2);
        app.screen = AppScreen::Loading;
        app.on_prepared(1, settings(), Err(QuizError::source("late")));
        assert_eq!(app.screen, AppScreen::Loading);
        assert!(app.wizard.error.is_none());
    }

    #[test]
    fn test_source_failure_returns_to_wizard_with_message() {
        let (mut app, _rx) = test_app();
        app.pending_start = Some(1);
        app.on_prepared(1, settings(), Err(QuizError::source("down")));
        assert_eq!(app.screen, AppScreen::Wizard);
        assert_eq!(app.wizard.step, WizardStep::Review);
        assert!(app.session.is_none());
        assert!(app.wizard.error.as_deref().unwrap_or("").contains("down"));
    }

    #[test]
    fn test_failed_submission_keeps_answers_and_shows_retry() {
        let (mut app, rx) = test_app();
        start_session(&mut app);
        assert_eq!(app.screen, AppScreen::Test);
        for _ in 0..5 {
            app.choose_option(Some(0));
            app.next_question();
        }
        app.request_finish();
        assert!(matches!(app.overlay, TestOverlay::ConfirmFinish));
        app.confirm_finish();

        app.handle_response(next_response(&rx));
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.answered_count(), 5);
        assert!(session.submission().is_idle());
        assert!(app.status.as_deref().unwrap_or("").contains("retry"));
    }

    fn next_response(rx: &mpsc::Receiver<AppEvent>) -> Response {
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::Response(r) => break r,
                _ => continue,
            }
        }
    }

    #[test]
    fn test_abandon_refused_while_submission_pending() {
        let (mut app, rx) = test_app();
        start_session(&mut app);
        for _ in 0..5 {
            app.choose_option(Some(0));
            app.next_question();
        }
        app.request_finish();
        app.confirm_finish();
        assert!(app.session.as_ref().unwrap().submission().is_pending());

        app.request_abandon();
        assert!(matches!(app.overlay, TestOverlay::None));
        assert_eq!(app.status.as_deref(), Some("Submission in progress..."));
        app.confirm_abandon();
        assert_eq!(app.screen, AppScreen::Test);
        assert!(app.session.is_some());

        app.handle_response(next_response(&rx));
        app.request_abandon();
        assert!(matches!(app.overlay, TestOverlay::ConfirmAbandon));
        app.confirm_abandon();
        assert_eq!(app.screen, AppScreen::Menu);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_late_subject_list_from_earlier_wizard_is_ignored() {
        let (mut app, rx) = test_app();
        app.open_wizard();
        let first = next_response(&rx);
        app.go_to_menu();
        app.open_wizard();
        let second = next_response(&rx);

        app.handle_response(first);
        assert!(app.wizard.subjects_loading);
        assert!(app.wizard.subjects.is_empty());

        app.handle_response(second);
        assert!(!app.wizard.subjects_loading);
        assert_eq!(app.wizard.subjects.len(), 3);
    }

    #[test]
    fn test_next_is_blocked_until_answered() {
        let (mut app, _rx) = test_app();
        start_session(&mut app);
        app.next_question();
        assert_eq!(app.session.as_ref().unwrap().current_index(), 0);
        assert!(app.status.is_some());
        app.choose_option(Some(1));
        app.next_question();
        assert_eq!(app.session.as_ref().unwrap().current_index(), 1);
    }

    #[test]
    fn test_tick_for_other_session_is_ignored() {
        let (mut app, _rx) = test_app();
        start_session(&mut app);
        let before = app.session.as_ref().unwrap().remaining_secs();
        app.on_second(999);
        assert_eq!(app.session.as_ref().unwrap().remaining_secs(), before);
        let id = app.session.as_ref().unwrap().id();
        app.on_second(id);
        assert_eq!(app.session.as_ref().unwrap().remaining_secs(), before - 1);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("submission failed: x"), "Submission failed: x");
        assert_eq!(capitalize(""), "");
    }
}
