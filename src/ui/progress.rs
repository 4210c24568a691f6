//! ui::progress
//!
//! Work-in-progress indicators.
//!
//! # Design
//!
//! A [`Progress`] is started and stopped as a pair. Callers in `deploy`
//! wrap it in a guard so it is stopped exactly once on every exit path.
//! The [`Spinner`] only animates when stderr is a terminal; otherwise it
//! stays silent so piped output is not polluted with control codes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use is_terminal::IsTerminal;

/// A start/stop progress indicator.
pub trait Progress: Send + Sync {
    /// Begin showing `message` as in progress.
    fn start(&self, message: &str);

    /// Clear the indicator, optionally replacing it with `final_message`.
    fn stop(&self, final_message: Option<&str>);
}

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Terminal spinner drawn on stderr.
#[derive(Default)]
pub struct Spinner {
    bar: Mutex<Option<ProgressBar>>,
}

impl std::fmt::Debug for Spinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.bar.lock().map(|b| b.is_some()).unwrap_or(false);
        f.debug_struct("Spinner").field("active", &active).finish()
    }
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(message: &str) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        if !std::io::stderr().is_terminal() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map(|style| style.tick_chars(TICK_CHARS))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar
    }
}

impl Progress for Spinner {
    fn start(&self, message: &str) {
        let Ok(mut bar) = self.bar.lock() else {
            return;
        };
        if bar.is_some() {
            return;
        }
        let spinner = Self::build(message);
        spinner.enable_steady_tick(TICK_INTERVAL);
        *bar = Some(spinner);
    }

    fn stop(&self, final_message: Option<&str>) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(spinner) = bar.take() {
                spinner.finish_and_clear();
            }
        }
        if let Some(message) = final_message {
            println!("{}", message);
        }
    }
}

/// Progress that records start/stop calls, for tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    starts: AtomicUsize,
    stops: AtomicUsize,
    final_messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Whether a start has not been matched by a stop.
    pub fn is_active(&self) -> bool {
        self.starts() > self.stops()
    }

    pub fn final_messages(&self) -> Vec<String> {
        self.final_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Progress for RecordingProgress {
    fn start(&self, _message: &str) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self, final_message: Option<&str>) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = final_message {
            if let Ok(mut messages) = self.final_messages.lock() {
                messages.push(message.to_string());
            }
        }
    }
}
