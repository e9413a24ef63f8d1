use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

use quizr::error::QuizError;
use quizr::session::{Question, StoredResult, Subject};
use quizr::source::Student;
use quizr::wizard::TestSettings;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
    /// One countdown second for the session with this id.
    Second { session_id: u64 },
    /// A background request finished.
    Response(Response),
}

/// Outcomes posted by worker threads. All state changes happen when the UI
/// thread receives them.
pub enum Response {
    /// Subject list for the wizard opened by request `request`.
    Subjects {
        request: u64,
        outcome: Result<Vec<Subject>, QuizError>,
    },
    /// Student registered and questions fetched for the start request `request`.
    Prepared {
        request: u64,
        settings: TestSettings,
        outcome: Result<(Student, Vec<Question>), QuizError>,
    },
    Submitted {
        session_id: u64,
        outcome: Result<StoredResult, QuizError>,
    },
    History(Result<Vec<StoredResult>, QuizError>),
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => {
                            if input_tx.send(AppEvent::Key(key)).is_err() {
                                return;
                            }
                        }
                        Ok(Event::Resize(w, h)) => {
                            if input_tx.send(AppEvent::Resize(w, h)).is_err() {
                                return;
                            }
                        }
                        _ => {}
                    }
                } else if input_tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for the ticker and worker threads.
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
