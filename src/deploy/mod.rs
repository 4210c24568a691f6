//! deploy
//!
//! The deployment orchestration core.
//!
//! # Architecture
//!
//! ```text
//! resolver -> git::metadata -> upload -> monitor (unless detached) -> report
//! ```
//!
//! - [`resolver`] - environment and service resolution
//! - [`upload`] - the single upload attempt, with scoped progress
//! - [`monitor`] - build-log retry and deployment-log streaming
//! - [`workflow`] - sequencing and the final summary
//! - [`report`] - operator-facing output seams
//! - [`trace`] - narration seam enabled by `--verbose`
//!
//! # Invariants
//!
//! - Stages run strictly in order; no two remote calls overlap
//! - Only git collection and build-log failures are absorbed
//! - Every remote call and sleep honors the cancellation token

pub mod error;
pub mod monitor;
pub mod report;
pub mod resolver;
pub mod trace;
pub mod upload;
pub mod workflow;

use std::future::Future;

use tokio_util::sync::CancellationToken;

pub use error::DeployError;
pub use workflow::{Collaborators, DeployFlags, DeployOptions, DeployOutcome, Deployer};

/// Run `future` unless `cancel` fires first.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, DeployError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployError::Cancelled),
        output = future => Ok(output),
    }
}
