use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running(u32),
    /// Reported exactly once, on the tick that reaches zero.
    Expired,
    Stopped,
}

/// Whole-second countdown. Never goes below zero and reports expiry once.
#[derive(Clone, Debug)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    expired: bool,
    stopped: bool,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            expired: false,
            stopped: false,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Stopped;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.expired = true;
            self.stopped = true;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining_secs)
        }
    }

    /// Halt without expiring, e.g. once a result has been stored.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }

    /// True once a tick has reported `Expired`.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }
}

/// Handle to a background thread that emits one event per `period`.
///
/// Dropping the handle cancels the thread and waits for it to exit, so no
/// tick is produced after the owner is gone.
pub struct Ticker {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<T, F>(period: Duration, tx: Sender<T>, mut make_event: F) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let mut deadline = Instant::now() + period;
            loop {
                let wait = deadline.saturating_duration_since(Instant::now());
                match cancel_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        if tx.send(make_event()).is_err() {
                            return;
                        }
                        deadline += period;
                    }
                    // Explicit cancel or the handle was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        });

        Self {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("ticker thread panicked before shutdown");
            }
            log::debug!("ticker cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Render seconds as `m:ss`.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
