//! backend::mock
//!
//! Mock backend implementation for deterministic testing.
//!
//! # Design
//!
//! The mock backend stores projects and environments in memory, records
//! every operation, and can be configured to fail or stall specific calls.
//!
//! # Example
//!
//! ```
//! use skyway::backend::mock::MockBackend;
//! use skyway::backend::Backend;
//! use skyway::core::types::{Environment, EnvironmentId, Project, ProjectId};
//!
//! # tokio_test::block_on(async {
//! let project = Project {
//!     id: ProjectId::new("prj_1").unwrap(),
//!     name: "shop".to_string(),
//!     services: vec![],
//! };
//! let backend = MockBackend::new()
//!     .with_project(project.clone())
//!     .with_environment(&project.id, Environment {
//!         id: EnvironmentId::new("env_1").unwrap(),
//!         name: "production".to_string(),
//!     });
//!
//! let env = backend.resolve_environment(&project.id, "production").await.unwrap();
//! assert_eq!(env.id.as_str(), "env_1");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{
    Backend, BackendError, LogLine, LogSink, LogTarget, UploadRequest, UploadResult,
};
use crate::archive::Archive;
use crate::core::types::{Environment, Project, ProjectId, ServiceId};

/// Mock backend for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockBackendInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockBackendInner {
    projects: HashMap<ProjectId, Project>,
    environments: Vec<(ProjectId, Environment)>,
    upload_result: UploadResult,
    build_lines: Vec<LogLine>,
    deployment_lines: Vec<LogLine>,
    /// Remaining build-log calls that fail, and with what.
    build_log_failures: Option<(usize, BackendError)>,
    /// One build-log call that stops after this many lines, and with what.
    build_log_interruption: Option<(usize, BackendError)>,
    fail_on: Option<FailOn>,
    stall_on: Option<StallOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_project with the given error.
    GetProject(BackendError),
    /// Fail resolve_environment with the given error.
    ResolveEnvironment(BackendError),
    /// Fail upload with the given error.
    Upload(BackendError),
    /// Fail stream_deployment_logs with the given error.
    DeploymentLogs(BackendError),
}

/// Configuration for which operation never completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallOn {
    Upload,
    BuildLogs,
    DeploymentLogs,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetProject {
        project_id: String,
    },
    ResolveEnvironment {
        project_id: String,
        name: String,
    },
    Upload {
        project_id: String,
        environment_id: String,
        service_id: Option<String>,
        is_repo: bool,
        archive_sha256: String,
    },
    FetchActiveBuildLogs {
        offset: usize,
    },
    StreamDeploymentLogs {
        max_lines: usize,
    },
}

impl MockBackend {
    /// Create a new empty mock backend.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockBackendInner {
                projects: HashMap::new(),
                environments: Vec::new(),
                upload_result: UploadResult {
                    url: "https://dashboard.mock/build/1".to_string(),
                    deployment_domain: String::new(),
                    deployment_id: None,
                },
                build_lines: Vec::new(),
                deployment_lines: Vec::new(),
                build_log_failures: None,
                build_log_interruption: None,
                fail_on: None,
                stall_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockBackendInner> {
        self.inner.lock().unwrap()
    }

    /// Add a project.
    pub fn with_project(self, project: Project) -> Self {
        self.lock().projects.insert(project.id.clone(), project);
        self
    }

    /// Add an environment to a project.
    pub fn with_environment(self, project_id: &ProjectId, environment: Environment) -> Self {
        self.lock()
            .environments
            .push((project_id.clone(), environment));
        self
    }

    /// Set what a successful upload returns.
    pub fn with_upload_result(self, result: UploadResult) -> Self {
        self.lock().upload_result = result;
        self
    }

    /// Set the lines emitted by a successful build-log fetch.
    pub fn with_build_lines(self, lines: &[&str]) -> Self {
        self.lock().build_lines = lines.iter().map(|l| LogLine::new(*l)).collect();
        self
    }

    /// Set the lines emitted by deployment-log streaming.
    pub fn with_deployment_lines(self, lines: &[&str]) -> Self {
        self.lock().deployment_lines = lines.iter().map(|l| LogLine::new(*l)).collect();
        self
    }

    /// Fail the next `times` build-log fetches with `error`.
    ///
    /// # Example
    ///
    /// ```
    /// use skyway::backend::mock::MockBackend;
    /// use skyway::backend::BackendError;
    ///
    /// let backend = MockBackend::new()
    ///     .fail_build_logs(3, BackendError::NotFound("no active build".into()));
    /// ```
    pub fn fail_build_logs(self, times: usize, error: BackendError) -> Self {
        self.lock().build_log_failures = Some((times, error));
        self
    }

    /// Make the next successful build-log call fail once it has emitted
    /// lines up to (not including) index `after`.
    pub fn interrupt_build_logs(self, after: usize, error: BackendError) -> Self {
        self.lock().build_log_interruption = Some((after, error));
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Configure an operation to never complete.
    pub fn stall_on(self, stall_on: StallOn) -> Self {
        self.lock().stall_on = Some(stall_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Count recorded build-log fetches.
    pub fn build_log_attempts(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::FetchActiveBuildLogs { .. }))
            .count()
    }

    /// Count recorded uploads.
    pub fn upload_count(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::Upload { .. }))
            .count()
    }

    /// Whether any log endpoint was called.
    pub fn logs_requested(&self) -> bool {
        self.lock().operations.iter().any(|op| {
            matches!(
                op,
                MockOperation::FetchActiveBuildLogs { .. }
                    | MockOperation::StreamDeploymentLogs { .. }
            )
        })
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Option<BackendError> {
        let inner = self.lock();
        match &inner.fail_on {
            Some(FailOn::GetProject(e)) if expected == "get_project" => Some(e.clone()),
            Some(FailOn::ResolveEnvironment(e)) if expected == "resolve_environment" => {
                Some(e.clone())
            }
            Some(FailOn::Upload(e)) if expected == "upload" => Some(e.clone()),
            Some(FailOn::DeploymentLogs(e)) if expected == "deployment_logs" => Some(e.clone()),
            _ => None,
        }
    }

    async fn maybe_stall(&self, stall: StallOn) {
        let stalled = self.lock().stall_on == Some(stall);
        if stalled {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_project(&self, project_id: &ProjectId) -> Result<Project, BackendError> {
        self.record(MockOperation::GetProject {
            project_id: project_id.to_string(),
        });

        if let Some(e) = self.check_fail("get_project") {
            return Err(e);
        }

        self.lock()
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("project {}", project_id)))
    }

    async fn resolve_environment(
        &self,
        project_id: &ProjectId,
        name: &str,
    ) -> Result<Environment, BackendError> {
        self.record(MockOperation::ResolveEnvironment {
            project_id: project_id.to_string(),
            name: name.to_string(),
        });

        if let Some(e) = self.check_fail("resolve_environment") {
            return Err(e);
        }

        self.lock()
            .environments
            .iter()
            .find(|(p, env)| p == project_id && env.name == name)
            .map(|(_, env)| env.clone())
            .ok_or_else(|| BackendError::NotFound(format!("environment {}", name)))
    }

    async fn upload(
        &self,
        request: &UploadRequest,
        archive: Archive,
    ) -> Result<UploadResult, BackendError> {
        self.record(MockOperation::Upload {
            project_id: request.project_id.to_string(),
            environment_id: request.environment_id.to_string(),
            service_id: request.service_id.as_ref().map(ServiceId::to_string),
            is_repo: request.git_info.is_repo,
            archive_sha256: archive.sha256,
        });

        self.maybe_stall(StallOn::Upload).await;

        if let Some(e) = self.check_fail("upload") {
            return Err(e);
        }

        Ok(self.lock().upload_result.clone())
    }

    async fn fetch_active_build_logs(
        &self,
        _target: &LogTarget,
        offset: usize,
        sink: &dyn LogSink,
    ) -> Result<(), BackendError> {
        self.record(MockOperation::FetchActiveBuildLogs { offset });

        self.maybe_stall(StallOn::BuildLogs).await;

        let (lines, interruption) = {
            let mut inner = self.lock();
            if let Some((remaining, error)) = inner.build_log_failures.as_mut() {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(error.clone());
                }
            }
            (inner.build_lines.clone(), inner.build_log_interruption.take())
        };

        if let Some((after, error)) = interruption {
            for line in lines.iter().take(after).skip(offset) {
                sink.line(line);
            }
            return Err(error);
        }
        for line in lines.iter().skip(offset) {
            sink.line(line);
        }
        Ok(())
    }

    async fn stream_deployment_logs(
        &self,
        _target: &LogTarget,
        max_lines: usize,
        sink: &dyn LogSink,
    ) -> Result<(), BackendError> {
        self.record(MockOperation::StreamDeploymentLogs { max_lines });

        self.maybe_stall(StallOn::DeploymentLogs).await;

        if let Some(e) = self.check_fail("deployment_logs") {
            return Err(e);
        }

        let lines = self.lock().deployment_lines.clone();
        let skip = lines.len().saturating_sub(max_lines);
        for line in lines.iter().skip(skip) {
            sink.line(line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EnvironmentId, GitInfo};

    struct Collect(Mutex<Vec<String>>);

    impl LogSink for Collect {
        fn line(&self, line: &LogLine) {
            self.0.lock().unwrap().push(line.message.clone());
        }
    }

    fn project() -> Project {
        Project {
            id: ProjectId::new("prj_1").unwrap(),
            name: "shop".into(),
            services: vec![],
        }
    }

    fn target() -> LogTarget {
        LogTarget {
            project_id: ProjectId::new("prj_1").unwrap(),
            environment_id: EnvironmentId::new("env_1").unwrap(),
            deployment_id: None,
        }
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let backend = MockBackend::new();
        let err = backend
            .get_project(&ProjectId::new("missing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn environment_lookup_is_scoped_to_project() {
        let other = ProjectId::new("prj_other").unwrap();
        let backend = MockBackend::new().with_project(project()).with_environment(
            &other,
            Environment {
                id: EnvironmentId::new("env_x").unwrap(),
                name: "production".into(),
            },
        );

        let result = backend
            .resolve_environment(&project().id, "production")
            .await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }

    #[tokio::test]
    async fn build_log_failures_count_down() {
        let backend = MockBackend::new()
            .with_build_lines(&["step 1", "step 2"])
            .fail_build_logs(2, BackendError::RateLimited);
        let sink = Collect(Mutex::new(Vec::new()));

        assert!(backend.fetch_active_build_logs(&target(), 0, &sink).await.is_err());
        assert!(backend.fetch_active_build_logs(&target(), 0, &sink).await.is_err());
        assert!(backend.fetch_active_build_logs(&target(), 0, &sink).await.is_ok());

        assert_eq!(backend.build_log_attempts(), 3);
        assert_eq!(*sink.0.lock().unwrap(), vec!["step 1", "step 2"]);
    }

    #[tokio::test]
    async fn interrupted_build_logs_keep_emitted_lines() {
        let backend = MockBackend::new()
            .with_build_lines(&["step 1", "step 2", "step 3"])
            .interrupt_build_logs(2, BackendError::NetworkError("reset".into()));
        let sink = Collect(Mutex::new(Vec::new()));

        assert!(backend.fetch_active_build_logs(&target(), 0, &sink).await.is_err());
        assert!(backend.fetch_active_build_logs(&target(), 2, &sink).await.is_ok());

        assert_eq!(*sink.0.lock().unwrap(), vec!["step 1", "step 2", "step 3"]);
    }

    #[tokio::test]
    async fn deployment_logs_are_tailed() {
        let backend = MockBackend::new().with_deployment_lines(&["a", "b", "c"]);
        let sink = Collect(Mutex::new(Vec::new()));

        backend
            .stream_deployment_logs(&target(), 2, &sink)
            .await
            .unwrap();

        assert_eq!(*sink.0.lock().unwrap(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn upload_records_request() {
        let backend = MockBackend::new().fail_on(FailOn::Upload(BackendError::RateLimited));
        let request = UploadRequest {
            project_id: ProjectId::new("prj_1").unwrap(),
            environment_id: EnvironmentId::new("env_1").unwrap(),
            service_id: None,
            root_dir: ".".into(),
            git_info: GitInfo::default(),
        };
        let archive = Archive {
            bytes: vec![],
            file_count: 0,
            sha256: "abc".into(),
        };

        let err = backend.upload(&request, archive).await.unwrap_err();
        assert_eq!(err, BackendError::RateLimited);
        assert_eq!(
            backend.operations(),
            vec![MockOperation::Upload {
                project_id: "prj_1".into(),
                environment_id: "env_1".into(),
                service_id: None,
                is_repo: false,
                archive_sha256: "abc".into(),
            }]
        );
    }
}
