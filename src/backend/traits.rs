//! backend::traits
//!
//! Backend trait definition for the remote build and runtime platform.
//!
//! # Design
//!
//! The `Backend` trait is async because every operation involves network
//! I/O. All methods return `Result` so callers decide which failures are
//! fatal: the deploy workflow absorbs build-log failures and propagates
//! everything else.
//!
//! # Example
//!
//! ```ignore
//! use skyway::backend::{Backend, LogTarget};
//!
//! async fn tail(backend: &dyn Backend, target: &LogTarget, sink: &dyn LogSink) -> Result<(), BackendError> {
//!     backend.stream_deployment_logs(target, 1000, sink).await
//! }
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::Archive;
use crate::core::types::{
    DeploymentId, Environment, EnvironmentId, GitInfo, Project, ProjectId, ServiceId,
};

/// Errors from backend operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The API answered with something we could not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A single upload submitted to the platform.
///
/// Built once per invocation and submitted at most once.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub project_id: ProjectId,
    pub environment_id: EnvironmentId,
    /// `None` lets the platform infer the service
    pub service_id: Option<ServiceId>,
    pub root_dir: PathBuf,
    pub git_info: GitInfo,
}

/// What the platform returns for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Web URL of the build logs
    pub url: String,
    /// Public domain of the deployment; empty until the platform assigns one
    #[serde(default)]
    pub deployment_domain: String,
    /// Deployment created by the upload, when the platform reports it
    #[serde(default)]
    pub deployment_id: Option<DeploymentId>,
}

/// Which deployment's logs to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub project_id: ProjectId,
    pub environment_id: EnvironmentId,
    /// `None` means the latest deployment in the environment
    pub deployment_id: Option<DeploymentId>,
}

/// One line of build or deployment output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl LogLine {
    /// A line without a timestamp.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: None,
        }
    }
}

/// Receiver for streamed log lines.
pub trait LogSink: Send + Sync {
    fn line(&self, line: &LogLine);
}

/// Render a deployment domain as a public URL.
///
/// # Example
///
/// ```
/// use skyway::backend::render_public_url;
///
/// assert_eq!(render_public_url("shop.up.skyway.app"), "https://shop.up.skyway.app");
/// assert_eq!(render_public_url("http://localhost:3000"), "http://localhost:3000");
/// ```
pub fn render_public_url(deployment_domain: &str) -> String {
    if deployment_domain.starts_with("http://") || deployment_domain.starts_with("https://") {
        deployment_domain.to_string()
    } else {
        format!("https://{}", deployment_domain)
    }
}

/// The Backend trait for interacting with the deployment platform.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, BackendError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: Ask the user to log in or set a token
/// - `NotFound`: Resource doesn't exist (or no build is active yet)
/// - `RateLimited`: Back off and retry
/// - `ApiError`: Display error message to user
/// - `NetworkError`: Check connectivity
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the backend name (e.g., "http", "mock").
    fn name(&self) -> &'static str;

    /// Fetch a project and its services.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project doesn't exist or isn't visible
    async fn get_project(&self, project_id: &ProjectId) -> Result<Project, BackendError>;

    /// Resolve an environment of a project by exact name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no environment has that name
    async fn resolve_environment(
        &self,
        project_id: &ProjectId,
        name: &str,
    ) -> Result<Environment, BackendError>;

    /// Submit a packaged upload root.
    ///
    /// Called at most once per invocation.
    async fn upload(
        &self,
        request: &UploadRequest,
        archive: Archive,
    ) -> Result<UploadResult, BackendError>;

    /// Stream the currently active build's logs, starting at line `offset`,
    /// until the build finishes.
    ///
    /// Lines handed to `sink` before a failure stay delivered; callers retry
    /// from `offset` plus the number of lines they received.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no build is active yet (transient right after upload)
    async fn fetch_active_build_logs(
        &self,
        target: &LogTarget,
        offset: usize,
        sink: &dyn LogSink,
    ) -> Result<(), BackendError>;

    /// Stream up to `max_lines` of the deployment's most recent logs.
    async fn stream_deployment_logs(
        &self,
        target: &LogTarget,
        max_lines: usize,
        sink: &dyn LogSink,
    ) -> Result<(), BackendError>;

    /// Turn a deployment domain into a URL the operator can open.
    fn public_url(&self, deployment_domain: &str) -> String {
        render_public_url(deployment_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_adds_scheme() {
        assert_eq!(render_public_url("app.example.com"), "https://app.example.com");
        assert_eq!(
            render_public_url("https://app.example.com"),
            "https://app.example.com"
        );
    }

    #[test]
    fn upload_result_tolerates_missing_domain() {
        let result: UploadResult =
            serde_json::from_str(r#"{"url": "https://dash/build/1"}"#).unwrap();
        assert_eq!(result.url, "https://dash/build/1");
        assert!(result.deployment_domain.is_empty());
        assert!(result.deployment_id.is_none());
    }

    #[test]
    fn upload_result_camel_case() {
        let result: UploadResult = serde_json::from_str(
            r#"{"url": "u", "deploymentDomain": "d.example.com", "deploymentId": "dep_1"}"#,
        )
        .unwrap();
        assert_eq!(result.deployment_domain, "d.example.com");
        assert_eq!(result.deployment_id.unwrap().as_str(), "dep_1");
    }

    #[test]
    fn backend_error_display() {
        assert_eq!(
            format!("{}", BackendError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", BackendError::NotFound("project prj_1".into())),
            "not found: project prj_1"
        );
        assert_eq!(format!("{}", BackendError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                BackendError::ApiError {
                    status: 500,
                    message: "boom".into()
                }
            ),
            "API error: 500 - boom"
        );
        assert_eq!(
            format!("{}", BackendError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
    }
}
