//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module should
//! import `git2`. Skyway only reads repositories, to record where an upload
//! came from.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - HEAD commit, branch and remote queries
//! - Best-effort provenance collection ([`metadata::collect`])
//!
//! # Invariants
//!
//! - [`metadata::collect`] never returns an error; failures are captured in
//!   the returned [`GitInfo`](crate::core::types::GitInfo)
//!
//! # Example
//!
//! ```no_run
//! use skyway::git::metadata;
//! use std::path::Path;
//!
//! let info = metadata::collect(Path::new("."));
//! if info.is_repo {
//!     println!("{} @ {}", info.branch, info.commit.hash);
//! }
//! ```

mod interface;
pub mod metadata;

pub use interface::{CommitInfo, Git, GitError};
