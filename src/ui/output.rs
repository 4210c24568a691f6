//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Command results go to stdout and diagnostics to stderr. Workflow
//! narration is not printed here; it flows through `tracing` and is
//! enabled by `--verbose`.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Normal mode - standard output
    Normal,
    /// Verbose mode - workflow narration enabled
    Verbose,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    pub fn is_verbose(self) -> bool {
        self == Verbosity::Verbose
    }

    /// Default `tracing` filter directive for this verbosity.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
        }
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}
