//! deploy::workflow
//!
//! Sequences a deploy: resolve, collect provenance, upload, monitor, report.
//!
//! # Design
//!
//! Operator flags are resolved into [`DeployOptions`] once, up front. The
//! [`Deployer`] then runs each stage strictly in order; a stage only sees
//! what earlier stages returned, and the first failure ends the run.
//!
//! # Example
//!
//! ```ignore
//! let options = DeployOptions::resolve(flags, &project, &cwd);
//! let deployer = Deployer::new(collaborators, cancel);
//! let outcome = deployer.deploy(&project, &options).await?;
//! ```

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::archive;
use crate::backend::{Backend, LogSink, LogTarget, UploadRequest, UploadResult};
use crate::core::config::{ProjectConfig, DEFAULT_ENVIRONMENT};
use crate::core::types::GitInfo;
use crate::git::metadata;
use crate::ui::progress::Progress;
use crate::ui::prompts::ServicePrompt;

use super::error::DeployError;
use super::monitor::{LogMonitor, MonitorReport};
use super::report::{Reporter, Summary};
use super::resolver::{resolve_target, Target, TargetRequest};
use super::trace::Tracer;
use super::upload::UploadOrchestrator;
use super::until_cancelled;

/// Operator input for a deploy, before defaults apply.
#[derive(Debug, Clone, Default)]
pub struct DeployFlags {
    /// Directory to upload, relative to the working directory
    pub path: Option<PathBuf>,
    pub environment: Option<String>,
    pub service: Option<String>,
    pub detach: bool,
}

/// Fully defaulted deploy options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub root: PathBuf,
    pub environment: String,
    /// `None` means ask the service prompt
    pub service: Option<String>,
    pub detach: bool,
}

impl DeployOptions {
    /// Apply defaults to `flags`.
    ///
    /// Environment: flag, then linked environment, then `production`.
    /// Service: flag, then linked service, then the prompt.
    pub fn resolve(flags: DeployFlags, project: &ProjectConfig, cwd: &Path) -> Self {
        let root = resolve_upload_root(project, flags.path.as_deref(), cwd);
        let environment = non_empty(flags.environment)
            .or_else(|| non_empty(project.environment.clone()))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let service = non_empty(flags.service).or_else(|| non_empty(project.service.clone()));

        Self {
            root,
            environment,
            service,
            detach: flags.detach,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Directory that gets packaged and uploaded.
///
/// An explicit `path` is joined onto `cwd` and wins. Otherwise the linked
/// project path is used, and without one, `cwd` itself.
pub fn resolve_upload_root(project: &ProjectConfig, path: Option<&Path>, cwd: &Path) -> PathBuf {
    match (path, &project.project_path) {
        (Some(path), _) => cwd.join(path),
        (None, Some(project_path)) => project_path.clone(),
        (None, None) => cwd.to_path_buf(),
    }
}

/// Everything a deploy talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub backend: &'a dyn Backend,
    pub prompt: &'a dyn ServicePrompt,
    pub progress: &'a dyn Progress,
    pub sink: &'a dyn LogSink,
    pub reporter: &'a dyn Reporter,
    pub tracer: &'a dyn Tracer,
}

/// Result of a successful deploy.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub target: Target,
    pub git_info: GitInfo,
    pub upload: UploadResult,
    /// `None` when detached
    pub monitor: Option<MonitorReport>,
    /// `None` when detached
    pub summary: Option<Summary>,
}

/// Runs the deploy workflow.
pub struct Deployer<'a> {
    io: Collaborators<'a>,
    monitor: LogMonitor,
    cancel: CancellationToken,
}

impl<'a> Deployer<'a> {
    pub fn new(io: Collaborators<'a>, cancel: CancellationToken) -> Self {
        Self {
            io,
            monitor: LogMonitor::default(),
            cancel,
        }
    }

    pub fn with_monitor(mut self, monitor: LogMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Deploy `options.root` to the resolved target.
    ///
    /// # Errors
    ///
    /// Any resolution, upload or deployment-log failure, or `Cancelled`.
    /// Git and build-log failures are absorbed.
    pub async fn deploy(
        &self,
        project: &ProjectConfig,
        options: &DeployOptions,
    ) -> Result<DeployOutcome, DeployError> {
        let io = &self.io;

        let target = until_cancelled(
            &self.cancel,
            resolve_target(
                io.backend,
                io.prompt,
                io.tracer,
                TargetRequest {
                    project_id: &project.project_id,
                    environment: &options.environment,
                    service: options.service.as_deref(),
                },
            ),
        )
        .await??;

        if archive::ignore_file_present(&options.root) {
            io.tracer
                .trace(&format!("Using ignore file {}", archive::IGNORE_FILE));
        }

        io.tracer.trace("Getting Git information");
        let git_info = metadata::collect(&options.root);
        self.trace_git_info(&git_info);

        let request = UploadRequest {
            project_id: project.project_id.clone(),
            environment_id: target.environment.id.clone(),
            service_id: target.service.as_ref().map(|s| s.id.clone()),
            root_dir: options.root.clone(),
            git_info: git_info.clone(),
        };
        let upload = UploadOrchestrator::new(io.backend, io.progress, io.tracer)
            .submit(&request, &self.cancel)
            .await?;

        if options.detach {
            io.tracer.trace("Detached; not waiting for the build");
            return Ok(DeployOutcome {
                target,
                git_info,
                upload,
                monitor: None,
                summary: None,
            });
        }

        let log_target = LogTarget {
            project_id: project.project_id.clone(),
            environment_id: target.environment.id.clone(),
            deployment_id: upload.deployment_id.clone(),
        };
        let report = self
            .monitor
            .run(
                io.backend,
                &log_target,
                io.sink,
                io.reporter,
                io.tracer,
                &self.cancel,
            )
            .await?;

        let summary = Summary {
            logs_url: upload.url.clone(),
            public_url: (!upload.deployment_domain.is_empty())
                .then(|| io.backend.public_url(&upload.deployment_domain)),
        };
        for line in summary.lines() {
            io.reporter.notice(&line);
        }

        Ok(DeployOutcome {
            target,
            git_info,
            upload,
            monitor: Some(report),
            summary: Some(summary),
        })
    }

    fn trace_git_info(&self, info: &GitInfo) {
        let tracer = self.io.tracer;
        if !info.is_repo {
            tracer.trace("No Git repository found");
            if let Some(error) = &info.error {
                tracer.trace(error);
            }
            return;
        }
        tracer.trace(&format!(
            "Git information:\n   Repository name: {}\n   Branch: {}\n   Latest commit:\n      Hash: {}\n      Message: {}\n      Author: {}",
            info.repo_name, info.branch, info.commit.hash, info.commit.message, info.commit.author
        ));
    }
}
