//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to Git. All repository reads flow
//! through [`Git`], which returns structured results and normalizes errors
//! into typed failure categories. Skyway only ever reads from a repository.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BareRepo`]: Repository has no working directory
//! - [`GitError::UnbornHead`]: Repository has no commits yet
//! - [`GitError::AccessError`]: `.git` exists but cannot be read
//!
//! # Example
//!
//! ```ignore
//! use skyway::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head_commit()?;
//! println!("HEAD is {} by {}", head.oid, head.author_name);
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// HEAD points at a branch with no commits.
    #[error("repository has no commits yet")]
    UnbornHead,

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match (err.code(), err.class()) {
            (git2::ErrorCode::UnbornBranch, _) => GitError::UnbornHead,
            (git2::ErrorCode::Locked, _) | (_, git2::ErrorClass::Os) => GitError::AccessError {
                message: format!("{}: {}", context, err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::from_git2(err, "git")
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Full hex object id
    pub oid: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2` directly.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::AccessError`] if a repository exists but cannot be read
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::NotARepo {
                path: path.to_path_buf(),
            },
            _ => GitError::from_git2(e, &path.display().to_string()),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Get the working directory of the repository.
    pub fn work_dir(&self) -> Result<PathBuf, GitError> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(GitError::BareRepo)
    }

    /// Get the commit HEAD points at.
    ///
    /// # Errors
    ///
    /// - [`GitError::UnbornHead`] if the repository has no commits
    pub fn head_commit(&self) -> Result<CommitInfo, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let author = commit.author();

        Ok(CommitInfo {
            oid: commit.id().to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
        })
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns the unborn branch name for a fresh repository and `None`
    /// if HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                // HEAD names a branch that doesn't exist yet
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(String::from))
            }
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Internal {
                message: e.message().to_string(),
            }),
        }
    }

    /// Get the default remote name (usually "origin").
    ///
    /// Returns the first remote found, or `None` if no remotes exist.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        // Prefer "origin" if it exists
        for name in remotes.iter().flatten() {
            if name == "origin" {
                return Ok(Some(name.to_string()));
            }
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    /// Extract a repository name from a remote URL.
    ///
    /// Handles HTTPS, SSH and scp-like URLs:
    ///
    /// ```
    /// use skyway::git::Git;
    ///
    /// assert_eq!(
    ///     Git::repo_name_from_url("https://github.com/owner/shop.git"),
    ///     Some("shop".to_string())
    /// );
    /// assert_eq!(
    ///     Git::repo_name_from_url("git@gitlab.com:group/sub/api"),
    ///     Some("api".to_string())
    /// );
    /// assert_eq!(Git::repo_name_from_url("https://github.com/"), None);
    /// ```
    pub fn repo_name_from_url(url: &str) -> Option<String> {
        let trimmed = url.trim().trim_end_matches('/');

        // Drop the scheme and host, or the `user@host:` prefix of scp-like URLs
        let path = if let Some((_, after_scheme)) = trimmed.split_once("://") {
            after_scheme.split_once('/')?.1
        } else {
            trimmed.split_once(':')?.1
        };

        let last = path.rsplit('/').next()?;
        let name = last.strip_suffix(".git").unwrap_or(last);
        if name.is_empty() {
            return None;
        }
        Some(name.to_string())
    }
}
