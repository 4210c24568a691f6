//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and resolves the project for the working directory
//! 2. Builds its collaborators (backend, prompt, progress, console)
//! 3. Calls into [`crate::deploy`] and formats the result
//!
//! # Async Commands
//!
//! Commands that talk to the platform are async. Each handler creates a
//! tokio runtime and blocks on its async body. While it runs, Ctrl-C
//! cancels the context's token instead of killing the process.

mod completion;
mod link;
mod logs;
mod up;

pub use completion::completion;
pub use link::link;
pub use logs::logs;
pub use up::up;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::args::Command;
use super::Context;
use crate::backend::http::HttpBackend;
use crate::core::config::{Config, EnvOverrides, ProjectConfig};
use crate::deploy::trace::{NoopTracer, Tracer, VerboseTracer};
use crate::deploy::{DeployError, DeployFlags};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Up {
            path,
            environment,
            service,
            detach,
        } => up::up(
            ctx,
            DeployFlags {
                path,
                environment,
                service,
                detach,
            },
        ),
        Command::Logs { environment, lines } => logs::logs(ctx, environment, lines),
        Command::Link {
            project_id,
            environment,
            service,
        } => link::link(ctx, &project_id, environment, service),
        Command::Completion { shell } => completion::completion(shell, &mut std::io::stdout()),
    }
}

/// Everything a remote command needs, loaded once.
struct Session {
    cwd: PathBuf,
    project: ProjectConfig,
    backend: HttpBackend,
}

impl Session {
    /// Load configuration and resolve the project for the working directory.
    ///
    /// Fails before any remote call when configuration is missing.
    fn open(ctx: &Context) -> Result<Self> {
        let cwd = ctx.cwd()?;
        let env = EnvOverrides::from_env();
        let config = Config::load().map_err(DeployError::from)?;
        let project = config
            .project_config(&env, &cwd)
            .map_err(DeployError::from)?;

        let credentials = config.credentials(&env).ok_or_else(|| {
            anyhow!("not logged in: set SKYWAY_TOKEN or SKYWAY_PROJECT_TOKEN, or add `token` to the config file")
        })?;
        let backend = HttpBackend::new(config.api_url(&env), Some(credentials));
        tracing::debug!(project = %project.project_id, api = backend.api_base(), "session opened");

        Ok(Self {
            cwd,
            project,
            backend,
        })
    }
}

/// Tracer matching the context's verbosity.
fn tracer(ctx: &Context) -> &'static dyn Tracer {
    if ctx.verbosity.is_verbose() {
        &VerboseTracer
    } else {
        &NoopTracer
    }
}

/// Cancel `cancel` when the operator presses Ctrl-C.
///
/// Must be called inside a runtime. Abort the handle once the command ends.
fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received; cancelling");
            cancel.cancel();
        }
    })
}
