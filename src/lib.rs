//! Skyway - deploy a local project directory to the Skyway platform
//!
//! Skyway resolves a deployment target (project, environment, service),
//! records where the upload came from, uploads the project tree, and then
//! follows the build and deployment until it can report a reachable URL.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, builds collaborators)
//! - [`deploy`] - Orchestrates Resolve → Collect → Upload → Monitor → Report
//! - [`core`] - Domain types and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`backend`] - Abstraction for the remote platform (HTTP v1)
//! - [`archive`] - Packaging of the upload root
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! 1. An upload is submitted at most once per invocation
//! 2. The progress indicator is released exactly once on every path
//! 3. Git problems never fail a deploy
//! 4. Cancellation is honored at every remote call and sleep

pub mod archive;
pub mod backend;
pub mod cli;
pub mod core;
pub mod deploy;
pub mod git;
pub mod ui;
