//! archive
//!
//! Packaging of the upload root into a single compressed tarball.
//!
//! # Filtering
//!
//! - `.git/` is never included
//! - `.gitignore` rules apply, whether or not the root is a repository
//! - `.railwayignore` rules apply on top, using gitignore syntax
//!
//! # Determinism
//!
//! Entries are walked in file-name order and written with deterministic
//! headers, so the same tree always produces the same digest.
//!
//! # Cancellation
//!
//! [`pack`] checks its token before each entry and stops with
//! [`ArchiveError::Cancelled`], so an abandoned packaging task ends promptly.

use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Name of the platform ignore file looked up at the upload root.
pub const IGNORE_FILE: &str = ".railwayignore";

/// Errors from packaging.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("upload root is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to walk upload root: {0}")]
    Walk(String),

    #[error("failed to add '{}' to archive: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("packaging cancelled")]
    Cancelled,
}

/// A packaged upload root.
#[derive(Clone)]
pub struct Archive {
    /// gzip-compressed tar bytes
    pub bytes: Vec<u8>,
    /// Number of regular files included
    pub file_count: usize,
    /// Hex SHA-256 of `bytes`
    pub sha256: String,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("len", &self.bytes.len())
            .field("file_count", &self.file_count)
            .field("sha256", &self.sha256)
            .finish()
    }
}

/// Check whether the platform ignore file exists at `root`.
pub fn ignore_file_present(root: &Path) -> bool {
    root.join(IGNORE_FILE).is_file()
}

/// Package `root` into a gzip-compressed tarball.
///
/// Entry names are relative to `root`.
pub fn pack(root: &Path, cancel: &CancellationToken) -> Result<Archive, ArchiveError> {
    if !root.is_dir() {
        return Err(ArchiveError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .parents(false)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE)
        .filter_entry(|entry| entry.file_name() != ".git")
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    builder.mode(tar::HeaderMode::Deterministic);

    let mut file_count = 0;
    for entry in walker {
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }
        let entry = entry.map_err(|e| ArchiveError::Walk(e.to_string()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let name = path
            .strip_prefix(root)
            .map_err(|e| ArchiveError::Walk(e.to_string()))?;
        builder
            .append_path_with_name(path, name)
            .map_err(|e| ArchiveError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        file_count += 1;
    }

    let encoder = builder.into_inner().map_err(|e| ArchiveError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;
    let bytes = encoder.finish().map_err(|e| ArchiveError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;
    let sha256 = hex::encode(Sha256::digest(&bytes));

    Ok(Archive {
        bytes,
        file_count,
        sha256,
    })
}
