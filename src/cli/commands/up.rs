//! cli::commands::up
//!
//! Upload and deploy a directory.
//!
//! # Algorithm
//!
//! 1. Load configuration and resolve the project (fails before any remote call)
//! 2. Resolve flags into `DeployOptions`
//! 3. Run the deploy workflow with terminal collaborators
//!
//! # Example
//!
//! ```bash
//! # Deploy the linked project to its default environment
//! skyway up
//!
//! # Deploy a subdirectory to staging without following logs
//! skyway up frontend -e staging --detach
//! ```

use anyhow::Result;

use super::{cancel_on_ctrl_c, tracer, Session};
use crate::cli::Context;
use crate::deploy::report::StdoutConsole;
use crate::deploy::{Collaborators, DeployFlags, DeployOptions, Deployer};
use crate::ui::progress::Spinner;
use crate::ui::prompts::DialoguerPrompt;

/// Run the `up` command.
pub fn up(ctx: &Context, flags: DeployFlags) -> Result<()> {
    // Use tokio runtime to run async code
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(up_async(ctx, flags))
}

async fn up_async(ctx: &Context, flags: DeployFlags) -> Result<()> {
    let tracer = tracer(ctx);
    tracer.trace("Using verbose mode");
    tracer.trace("Loading project configuration");
    let session = Session::open(ctx)?;

    let options = DeployOptions::resolve(flags, &session.project, &session.cwd);
    tracing::debug!(?options, "resolved deploy options");

    let prompt = DialoguerPrompt::new(ctx.interactive);
    let spinner = Spinner::new();
    let console = StdoutConsole;
    let collaborators = Collaborators {
        backend: &session.backend,
        prompt: &prompt,
        progress: &spinner,
        sink: &console,
        reporter: &console,
        tracer,
    };

    let signal = cancel_on_ctrl_c(ctx.cancel.clone());
    let result = Deployer::new(collaborators, ctx.cancel.clone())
        .deploy(&session.project, &options)
        .await;
    signal.abort();

    result?;
    Ok(())
}
