//! deploy::upload
//!
//! The single upload attempt of a deploy.
//!
//! # Invariants
//!
//! - The backend's `upload` is called at most once per [`UploadOrchestrator::submit`]
//! - The progress indicator is stopped exactly once on every exit path,
//!   including when the future is dropped mid-flight

use tokio_util::sync::CancellationToken;

use crate::archive::{self, ArchiveError};
use crate::backend::{Backend, UploadRequest, UploadResult};
use crate::ui::progress::Progress;

use super::error::DeployError;
use super::report::build_logs_notice;
use super::trace::Tracer;
use super::until_cancelled;

/// Message shown while the upload is in flight.
pub const PROGRESS_MESSAGE: &str = "Laying tracks in the clouds...";

/// Holds a started progress indicator and stops it exactly once.
///
/// Stopping happens in [`ProgressGuard::finish`] or, if that is never
/// reached, on drop.
pub struct ProgressGuard<'a> {
    progress: &'a dyn Progress,
    released: bool,
}

impl<'a> ProgressGuard<'a> {
    /// Start `progress` with `message`.
    pub fn acquire(progress: &'a dyn Progress, message: &str) -> Self {
        progress.start(message);
        Self {
            progress,
            released: false,
        }
    }

    /// Stop the indicator, leaving `final_message` in its place.
    pub fn finish(mut self, final_message: Option<&str>) {
        self.released = true;
        self.progress.stop(final_message);
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.progress.stop(None);
        }
    }
}

/// Packages the upload root and submits it.
pub struct UploadOrchestrator<'a> {
    backend: &'a dyn Backend,
    progress: &'a dyn Progress,
    tracer: &'a dyn Tracer,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(backend: &'a dyn Backend, progress: &'a dyn Progress, tracer: &'a dyn Tracer) -> Self {
        Self {
            backend,
            progress,
            tracer,
        }
    }

    /// Perform exactly one upload of `request`.
    ///
    /// # Errors
    ///
    /// - `Archive` if the root cannot be packaged
    /// - `UploadFailed` if the backend rejects the upload
    /// - `Cancelled` if `cancel` fires first
    pub async fn submit(
        &self,
        request: &UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadResult, DeployError> {
        let guard = ProgressGuard::acquire(self.progress, PROGRESS_MESSAGE);

        let root = request.root_dir.clone();
        let packing = cancel.clone();
        let archive = until_cancelled(
            cancel,
            tokio::task::spawn_blocking(move || archive::pack(&root, &packing)),
        )
        .await?
        .map_err(|e| ArchiveError::Walk(e.to_string()))?
        .map_err(|e| match e {
            ArchiveError::Cancelled => DeployError::Cancelled,
            other => DeployError::Archive(other),
        })?;
        self.tracer.trace(&format!(
            "Packaged {} files ({} bytes, sha256 {})",
            archive.file_count,
            archive.bytes.len(),
            archive.sha256
        ));

        let result = until_cancelled(cancel, self.backend.upload(request, archive))
            .await?
            .map_err(|source| DeployError::UploadFailed { source })?;

        guard.finish(Some(&build_logs_notice(&result.url)));
        Ok(result)
    }
}
