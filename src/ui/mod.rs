//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive service selection
//! - [`output`] - Output formatting and display
//! - [`progress`] - Work-in-progress indicators
//!
//! # Design
//!
//! All terminal interaction goes through this module so the deploy core
//! only sees the [`prompts::ServicePrompt`] and [`progress::Progress`]
//! seams, and interactive vs non-interactive mode is decided in one place.

pub mod output;
pub mod progress;
pub mod prompts;
