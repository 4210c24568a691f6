//! cli::commands::logs
//!
//! Print the tail of the latest deployment's logs.

use anyhow::Result;

use super::{cancel_on_ctrl_c, Session};
use crate::backend::{Backend, BackendError, LogTarget};
use crate::cli::Context;
use crate::core::config::DEFAULT_ENVIRONMENT;
use crate::deploy::report::StdoutConsole;
use crate::deploy::{until_cancelled, DeployError};

/// Run the `logs` command.
pub fn logs(ctx: &Context, environment: Option<String>, lines: usize) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(logs_async(ctx, environment, lines))
}

async fn logs_async(ctx: &Context, environment: Option<String>, lines: usize) -> Result<()> {
    let session = Session::open(ctx)?;
    let name = environment
        .filter(|e| !e.is_empty())
        .or_else(|| session.project.environment.clone())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

    let signal = cancel_on_ctrl_c(ctx.cancel.clone());
    let result = stream(&session, &name, lines, ctx).await;
    signal.abort();

    result?;
    Ok(())
}

async fn stream(session: &Session, name: &str, lines: usize, ctx: &Context) -> Result<(), DeployError> {
    let backend = &session.backend;
    let project_id = &session.project.project_id;

    let environment = until_cancelled(&ctx.cancel, backend.resolve_environment(project_id, name))
        .await?
        .map_err(|e| match e {
            BackendError::NotFound(_) => DeployError::TargetNotFound {
                name: name.to_string(),
            },
            other => DeployError::Backend {
                operation: "resolve environment",
                source: other,
            },
        })?;

    let target = LogTarget {
        project_id: project_id.clone(),
        environment_id: environment.id,
        deployment_id: None,
    };
    until_cancelled(
        &ctx.cancel,
        backend.stream_deployment_logs(&target, lines, &StdoutConsole),
    )
    .await?
    .map_err(|source| DeployError::DeploymentLogs { source })
}
