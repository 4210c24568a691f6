//! deploy::trace
//!
//! Tracing seam for the deploy workflow.
//!
//! The workflow narrates its progress through a [`Tracer`] instead of
//! printing, so `--verbose` only changes what is observed, never what runs.

use std::sync::Mutex;

/// Receiver of workflow narration.
pub trait Tracer: Send + Sync {
    fn trace(&self, message: &str);
}

/// Forwards narration to `tracing` under the `skyway::verbose` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerboseTracer;

impl Tracer for VerboseTracer {
    fn trace(&self, message: &str) {
        tracing::info!(target: "skyway::verbose", "{}", message);
    }
}

/// Discards narration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace(&self, _message: &str) {}
}

/// Stores narration for inspection.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    messages: Mutex<Vec<String>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages traced so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Whether any traced message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl Tracer for RecordingTracer {
    fn trace(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order() {
        let tracer = RecordingTracer::new();
        tracer.trace("Loading project");
        tracer.trace("Loading services");

        assert_eq!(tracer.messages(), vec!["Loading project", "Loading services"]);
        assert!(tracer.contains("services"));
        assert!(!tracer.contains("upload"));
    }

    #[test]
    fn noop_is_usable_as_trait_object() {
        let tracer: &dyn Tracer = &NoopTracer;
        tracer.trace("ignored");
    }
}
