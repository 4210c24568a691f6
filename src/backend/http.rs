//! backend::http
//!
//! Backend implementation over the platform's HTTP API.
//!
//! # Endpoints
//!
//! All paths are relative to the configured API base URL.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `get_project` | `GET /projects/{project}` |
//! | `resolve_environment` | `GET /projects/{project}/environments` |
//! | `upload` | `POST /projects/{project}/environments/{env}/up` (multipart) |
//! | `fetch_active_build_logs` | `GET .../environments/{env}/builds/active/logs?offset=N` |
//! | `stream_deployment_logs` | `GET .../environments/{env}/deployments/{id or latest}/logs?limit=N` |
//!
//! # Authentication
//!
//! Session tokens are sent as `Authorization: Bearer`. Project-scoped tokens
//! are sent in the `Project-Access-Token` header instead.
//!
//! # Example
//!
//! ```ignore
//! use skyway::backend::http::HttpBackend;
//! use skyway::core::config::Credentials;
//!
//! let backend = HttpBackend::new(
//!     "https://api.skyway.dev/v1",
//!     Some(Credentials::Session(token)),
//! );
//! let project = backend.get_project(&project_id).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    Backend, BackendError, LogLine, LogSink, LogTarget, UploadRequest, UploadResult,
};
use crate::archive::Archive;
use crate::core::config::Credentials;
use crate::core::types::{Environment, GitInfo, Project, ProjectId};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("skyway-cli/", env!("CARGO_PKG_VERSION"));

/// Header carrying a project-scoped token.
pub const PROJECT_TOKEN_HEADER: &str = "Project-Access-Token";

/// Header carrying the hex SHA-256 of the uploaded archive.
pub const ARCHIVE_DIGEST_HEADER: &str = "X-Archive-Sha256";

/// Delay between build-log pages when the build produced no new output.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// HTTP backend implementation.
pub struct HttpBackend {
    client: Client,
    api_base: String,
    credentials: Option<Credentials>,
    poll_interval: Duration,
}

// Credentials already redact themselves, but keep the shape explicit.
impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("api_base", &self.api_base)
            .field("has_credentials", &self.credentials.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Metadata part of a multipart upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMetadata<'a> {
    service_id: Option<&'a str>,
    root_dir_name: String,
    file_count: usize,
    git_info: &'a GitInfo,
}

/// Lifecycle of the active build as reported alongside each log page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum BuildStatus {
    Queued,
    Initializing,
    Building,
    Deploying,
    Success,
    Failed,
    Crashed,
    Removed,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    fn is_terminal(self) -> bool {
        !matches!(
            self,
            BuildStatus::Queued
                | BuildStatus::Initializing
                | BuildStatus::Building
                | BuildStatus::Deploying
        )
    }
}

#[derive(Debug, Deserialize)]
struct BuildLogPage {
    status: BuildStatus,
    #[serde(default)]
    lines: Vec<LogLine>,
}

#[derive(Debug, Deserialize)]
struct DeploymentLogPage {
    #[serde(default)]
    lines: Vec<LogLine>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl HttpBackend {
    /// Create a backend for `api_base`.
    ///
    /// Requests fail with `AuthRequired` when `credentials` is `None`.
    pub fn new(api_base: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the delay between empty build-log pages.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        match &self.credentials {
            Some(Credentials::Session(token)) => {
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
            }
            Some(Credentials::Project(token)) => {
                headers.insert(PROJECT_TOKEN_HEADER, header_value(token)?);
            }
            None => return Err(BackendError::AuthRequired),
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    fn project_url(&self, project_id: &ProjectId, path: &str) -> String {
        if path.is_empty() {
            format!("{}/projects/{}", self.api_base, project_id)
        } else {
            format!("{}/projects/{}/{}", self.api_base, project_id, path)
        }
    }

    fn environment_url(&self, target: &LogTarget, path: &str) -> String {
        self.project_url(
            &target.project_id,
            &format!("environments/{}/{}", target.environment_id, path),
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;
        handle_response(response).await
    }
}

fn header_value(value: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value)
        .map_err(|_| BackendError::AuthFailed("token contains invalid characters".into()))
}

/// Decode a successful response or map the failure status.
async fn handle_response<T: for<'de> Deserialize<'de>>(
    response: Response,
) -> Result<T, BackendError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    } else {
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };
        Err(map_status(status, message))
    }
}

/// Map a non-success HTTP status onto a backend error.
fn map_status(status: StatusCode, message: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED => BackendError::AuthFailed("invalid or expired token".into()),
        StatusCode::FORBIDDEN => BackendError::AuthFailed(format!("permission denied: {}", message)),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited,
        _ => BackendError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn get_project(&self, project_id: &ProjectId) -> Result<Project, BackendError> {
        self.get_json(&self.project_url(project_id, ""), &[]).await
    }

    async fn resolve_environment(
        &self,
        project_id: &ProjectId,
        name: &str,
    ) -> Result<Environment, BackendError> {
        let environments: Vec<Environment> = self
            .get_json(&self.project_url(project_id, "environments"), &[])
            .await?;

        environments
            .into_iter()
            .find(|env| env.name == name)
            .ok_or_else(|| BackendError::NotFound(format!("environment '{}'", name)))
    }

    async fn upload(
        &self,
        request: &UploadRequest,
        archive: Archive,
    ) -> Result<UploadResult, BackendError> {
        let url = self.project_url(
            &request.project_id,
            &format!("environments/{}/up", request.environment_id),
        );

        let metadata = UploadMetadata {
            service_id: request.service_id.as_ref().map(|s| s.as_str()),
            root_dir_name: request
                .root_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_count: archive.file_count,
            git_info: &request.git_info,
        };
        let metadata =
            serde_json::to_string(&metadata).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata)
                    .mime_str("application/json")
                    .map_err(|e| BackendError::NetworkError(e.to_string()))?,
            )
            .part(
                "archive",
                Part::bytes(archive.bytes)
                    .file_name("upload.tar.gz")
                    .mime_str("application/gzip")
                    .map_err(|e| BackendError::NetworkError(e.to_string()))?,
            );

        tracing::debug!(url, sha256 = %archive.sha256, files = archive.file_count, "POST upload");
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .header(ARCHIVE_DIGEST_HEADER, archive.sha256.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        handle_response(response).await
    }

    async fn fetch_active_build_logs(
        &self,
        target: &LogTarget,
        offset: usize,
        sink: &dyn LogSink,
    ) -> Result<(), BackendError> {
        let url = self.environment_url(target, "builds/active/logs");
        let mut offset = offset;

        loop {
            let page: BuildLogPage = self
                .get_json(&url, &[("offset", offset.to_string())])
                .await?;

            for line in &page.lines {
                sink.line(line);
            }
            offset += page.lines.len();

            if page.status.is_terminal() {
                tracing::debug!(status = ?page.status, offset, "build finished");
                return Ok(());
            }
            if page.lines.is_empty() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    async fn stream_deployment_logs(
        &self,
        target: &LogTarget,
        max_lines: usize,
        sink: &dyn LogSink,
    ) -> Result<(), BackendError> {
        let deployment = target
            .deployment_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("latest");
        let url = self.environment_url(target, &format!("deployments/{}/logs", deployment));

        let page: DeploymentLogPage = self
            .get_json(&url, &[("limit", max_lines.to_string())])
            .await?;

        // The server may ignore `limit`; keep only the tail.
        let skip = page.lines.len().saturating_sub(max_lines);
        for line in page.lines.iter().skip(skip) {
            sink.line(line);
        }
        Ok(())
    }
}
