//! cli
//!
//! Command-line interface layer for Skyway.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that build collaborators and call [`crate::deploy`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    pub verbosity: Verbosity,
    /// Interactive mode enabled.
    pub interactive: bool,
    /// Cancelled on Ctrl-C.
    pub cancel: CancellationToken,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            verbosity: Verbosity::Normal,
            interactive: false,
            cancel: CancellationToken::new(),
        }
    }
}

impl Context {
    /// Resolve the effective working directory.
    ///
    /// A relative `--cwd` is taken relative to the process directory. The
    /// result is canonical so it compares equal to linked project paths.
    pub fn cwd(&self) -> Result<PathBuf> {
        let current = std::env::current_dir().context("failed to read current directory")?;
        let cwd = match &self.cwd {
            Some(path) => current.join(path),
            None => current,
        };
        cwd.canonicalize()
            .with_context(|| format!("working directory {} is not accessible", cwd.display()))
    }
}

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins; otherwise the filter follows `verbosity`.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let verbosity = Verbosity::from_flags(cli.verbose);
    init_tracing(verbosity);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        verbosity,
        interactive: cli.interactive(),
        cancel: CancellationToken::new(),
    };

    commands::dispatch(cli.command, &ctx)
}
