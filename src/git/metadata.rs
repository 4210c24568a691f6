//! git::metadata
//!
//! Best-effort repository provenance for an upload.
//!
//! [`collect`] never fails: any problem reading the repository degrades to
//! `GitInfo { is_repo: false, error: Some(..) }`. Nothing is cached, so a
//! fixed repository state always yields the same result.

use std::path::Path;

use super::interface::{Git, GitError};
use crate::core::types::{CommitMeta, GitInfo};

/// Collect provenance for the repository containing `root`.
pub fn collect(root: &Path) -> GitInfo {
    match try_collect(root) {
        Ok(info) => info,
        Err(err) => {
            tracing::debug!(root = %root.display(), error = %err, "git metadata unavailable");
            GitInfo::not_a_repo(err.to_string())
        }
    }
}

fn try_collect(root: &Path) -> Result<GitInfo, GitError> {
    let git = Git::open(root)?;
    let work_dir = git.work_dir()?;

    let repo_name = remote_repo_name(&git).unwrap_or_else(|| {
        work_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let branch = git.current_branch()?.unwrap_or_default();

    let (commit, error) = match git.head_commit() {
        Ok(head) => (
            CommitMeta {
                hash: head.oid,
                message: head.message.trim_end().to_string(),
                author: head.author_name,
            },
            None,
        ),
        // A fresh repository is still a repository.
        Err(GitError::UnbornHead) => (CommitMeta::default(), Some(GitError::UnbornHead.to_string())),
        Err(e) => return Err(e),
    };

    Ok(GitInfo {
        is_repo: true,
        repo_name,
        branch,
        commit,
        error,
    })
}

/// Repository name from the default remote, if it has a parseable URL.
fn remote_repo_name(git: &Git) -> Option<String> {
    let remote = git.default_remote().ok().flatten()?;
    let url = git.remote_url(&remote).ok().flatten()?;
    Git::repo_name_from_url(&url)
}
