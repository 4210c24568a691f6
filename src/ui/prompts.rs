//! ui::prompts
//!
//! Interactive service selection.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. A project with zero or one
//! services never prompts, and in non-interactive mode an ambiguous choice
//! resolves to "no service" so the platform can infer one.

use dialoguer::Select;
use thiserror::Error;

use crate::core::types::Service;

/// Label of the trailing entry that defers the choice to the platform.
pub const SKIP_LABEL: &str = "Skip (let the platform choose)";

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<dialoguer::Error> for PromptError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                PromptError::Cancelled
            }
            dialoguer::Error::IO(e) => PromptError::IoError(e.to_string()),
        }
    }
}

/// Chooses which service an upload targets.
///
/// `Ok(None)` is a valid outcome meaning "let the platform infer".
pub trait ServicePrompt: Send + Sync {
    fn select(&self, services: &[Service]) -> Result<Option<Service>, PromptError>;
}

/// What to do for a given service list without asking anyone.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Resolved(Option<Service>),
    Ask,
}

fn decide(services: &[Service], interactive: bool) -> Decision {
    match services {
        [] => Decision::Resolved(None),
        [only] => Decision::Resolved(Some(only.clone())),
        _ if !interactive => Decision::Resolved(None),
        _ => Decision::Ask,
    }
}

/// Terminal prompt backed by dialoguer.
#[derive(Debug, Clone, Copy)]
pub struct DialoguerPrompt {
    interactive: bool,
}

impl DialoguerPrompt {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl ServicePrompt for DialoguerPrompt {
    fn select(&self, services: &[Service]) -> Result<Option<Service>, PromptError> {
        match decide(services, self.interactive) {
            Decision::Resolved(choice) => Ok(choice),
            Decision::Ask => {
                let mut items: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
                items.push(SKIP_LABEL);

                let selection = Select::new()
                    .with_prompt("Select a service")
                    .items(&items)
                    .default(0)
                    .interact_opt()?;

                match selection {
                    None => Err(PromptError::Cancelled),
                    Some(idx) => Ok(services.get(idx).cloned()),
                }
            }
        }
    }
}

/// Prompt that answers from a fixed script, for tests.
///
/// Counts how often it was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answer: Option<String>,
    cancel: bool,
    calls: std::sync::atomic::AtomicUsize,
}

impl ScriptedPrompt {
    /// Always pick the service with this name.
    pub fn choosing(name: impl Into<String>) -> Self {
        Self {
            answer: Some(name.into()),
            ..Default::default()
        }
    }

    /// Always skip.
    pub fn skipping() -> Self {
        Self::default()
    }

    /// Always cancel.
    pub fn cancelling() -> Self {
        Self {
            cancel: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl ServicePrompt for ScriptedPrompt {
    fn select(&self, services: &[Service]) -> Result<Option<Service>, PromptError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.cancel {
            return Err(PromptError::Cancelled);
        }
        Ok(self
            .answer
            .as_deref()
            .and_then(|name| services.iter().find(|s| s.name == name).cloned()))
    }
}
