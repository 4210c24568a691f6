//! deploy::error
//!
//! Failure taxonomy of the deploy workflow.
//!
//! Git collection and build-log failures never appear here: both are
//! absorbed before they reach the workflow's caller.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::backend::BackendError;
use crate::core::config::ConfigError;
use crate::ui::prompts::PromptError;

/// Errors that terminate a deploy.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Project configuration is missing or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No environment with the requested name.
    #[error("environment '{name}' not found")]
    TargetNotFound { name: String },

    /// No service with the requested name in the project.
    #[error("service '{name}' not found in project")]
    ServiceNotFound { name: String },

    /// Interactive service selection failed.
    #[error("service selection failed: {0}")]
    Prompt(PromptError),

    /// A remote read made while resolving the target failed.
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        source: BackendError,
    },

    /// The upload root could not be packaged.
    #[error("failed to package upload root: {0}")]
    Archive(#[from] ArchiveError),

    /// The single upload attempt failed.
    #[error("upload failed: {source}")]
    UploadFailed { source: BackendError },

    /// Deployment logs could not be streamed.
    #[error("failed to stream deployment logs: {source}")]
    DeploymentLogs { source: BackendError },

    /// The invocation was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl DeployError {
    /// Check whether this failure is a cancellation.
    ///
    /// Callers use this to skip the generic error diagnostic.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeployError::Cancelled)
    }

    pub(crate) fn backend(operation: &'static str, source: BackendError) -> Self {
        DeployError::Backend { operation, source }
    }
}

impl From<PromptError> for DeployError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Cancelled => DeployError::Cancelled,
            other => DeployError::Prompt(other),
        }
    }
}
