//! deploy::report
//!
//! Operator-facing output of a deploy.
//!
//! # Design
//!
//! The workflow writes through two seams: [`LogSink`] for streamed build
//! and deployment output, and [`Reporter`] for its own notices. The
//! console implementations cover both, so output stays in one ordered
//! stream.

use std::sync::Mutex;

use crate::backend::{LogLine, LogSink};

/// Marker printed between build and deployment output.
pub const BUILD_COMPLETED: &str = "======= Build Completed ======";

/// Final line when the platform has not assigned a domain yet.
pub const DEPLOYMENT_LIVE_GENERIC: &str = "☁️ Deployment is live";

/// Receiver of workflow notices.
pub trait Reporter: Send + Sync {
    fn notice(&self, message: &str);
}

/// Notice printed once the upload is accepted.
pub fn build_logs_notice(url: &str) -> String {
    format!("☁️ Build logs available at {}", url)
}

/// What the operator sees once monitoring completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Web URL of the build and deployment logs
    pub logs_url: String,
    /// Rendered public URL, if the platform assigned a domain
    pub public_url: Option<String>,
}

impl Summary {
    /// Render the summary as output lines.
    ///
    /// # Example
    ///
    /// ```
    /// use skyway::deploy::report::Summary;
    ///
    /// let summary = Summary { logs_url: "https://dash/b/1".into(), public_url: None };
    /// assert_eq!(summary.lines().last().unwrap(), "☁️ Deployment is live");
    /// ```
    pub fn lines(&self) -> Vec<String> {
        let live = match &self.public_url {
            Some(url) => format!("☁️ Deployment live at {}", url),
            None => DEPLOYMENT_LIVE_GENERIC.to_string(),
        };
        vec![
            format!("☁️ Deployment logs available at {}", self.logs_url),
            "OR run `skyway logs` to tail them here".to_string(),
            String::new(),
            live,
        ]
    }
}

/// Writes logs and notices to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl LogSink for StdoutConsole {
    fn line(&self, line: &LogLine) {
        println!("{}", line.message);
    }
}

impl Reporter for StdoutConsole {
    fn notice(&self, message: &str) {
        println!("{}", message);
    }
}

/// One thing written to a [`RecordingConsole`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Log(String),
    Notice(String),
}

/// Records everything written, for tests.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    events: Mutex<Vec<ConsoleEvent>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ConsoleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::Notice(n) => Some(n),
                ConsoleEvent::Log(_) => None,
            })
            .collect()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::Log(l) => Some(l),
                ConsoleEvent::Notice(_) => None,
            })
            .collect()
    }
}

impl LogSink for RecordingConsole {
    fn line(&self, line: &LogLine) {
        self.push(ConsoleEvent::Log(line.message.clone()));
    }
}

impl Reporter for RecordingConsole {
    fn notice(&self, message: &str) {
        self.push(ConsoleEvent::Notice(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_with_domain() {
        let summary = Summary {
            logs_url: "https://dash/b/1".into(),
            public_url: Some("https://shop.up.skyway.app".into()),
        };
        let lines = summary.lines();
        assert_eq!(lines[0], "☁️ Deployment logs available at https://dash/b/1");
        assert!(lines[1].contains("skyway logs"));
        assert_eq!(lines[3], "☁️ Deployment live at https://shop.up.skyway.app");
    }

    #[test]
    fn summary_without_domain_is_generic() {
        let summary = Summary {
            logs_url: "u".into(),
            public_url: None,
        };
        assert_eq!(summary.lines()[3], DEPLOYMENT_LIVE_GENERIC);
    }

    #[test]
    fn recording_console_separates_streams() {
        let console = RecordingConsole::new();
        console.notice("hello");
        console.line(&LogLine::new("step 1"));
        console.notice(BUILD_COMPLETED);

        assert_eq!(console.notices(), vec!["hello", BUILD_COMPLETED]);
        assert_eq!(console.log_lines(), vec!["step 1"]);
        assert_eq!(
            console.events()[1],
            ConsoleEvent::Log("step 1".into())
        );
    }
}
