//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--verbose` / `-v`: Narrate each workflow step
//! - `--no-interactive`: Never prompt

use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use std::path::PathBuf;

use crate::deploy::monitor::DEFAULT_DEPLOYMENT_LINES;

/// Skyway - deploy a local project to the Skyway platform
#[derive(Parser, Debug)]
#[command(name = "skyway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if skyway was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Narrate each step of the workflow
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Interactive unless `--no-interactive` was set or stdin is not a TTY.
    pub fn interactive(&self) -> bool {
        !self.no_interactive && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload and deploy a directory
    #[command(
        name = "up",
        long_about = "Upload and deploy a directory.\n\n\
            Packages the project (honoring .gitignore and .railwayignore), uploads it \
            to the linked project's environment, then follows the build and \
            deployment logs until the deployment is live.\n\n\
            With --detach, returns as soon as the upload is accepted."
    )]
    Up {
        /// Directory to deploy, relative to the working directory
        path: Option<PathBuf>,

        /// Environment to deploy to (default: linked environment, then production)
        #[arg(short, long)]
        environment: Option<String>,

        /// Service to deploy to (default: linked service, then prompt)
        #[arg(short, long)]
        service: Option<String>,

        /// Return right after the upload without following logs
        #[arg(short, long)]
        detach: bool,
    },

    /// Show the latest deployment's logs
    #[command(name = "logs")]
    Logs {
        /// Environment to read from (default: linked environment, then production)
        #[arg(short, long)]
        environment: Option<String>,

        /// Maximum number of lines to show
        #[arg(long, default_value_t = DEFAULT_DEPLOYMENT_LINES)]
        lines: usize,
    },

    /// Link the current directory to a project
    #[command(name = "link")]
    Link {
        /// Project identifier
        project_id: String,

        /// Default environment for this directory
        #[arg(short, long)]
        environment: Option<String>,

        /// Default service for this directory
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "EXAMPLES:
    # Bash (add to ~/.bashrc)
    skyway completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    skyway completion zsh >> ~/.zshrc

    # Fish
    skyway completion fish > ~/.config/fish/completions/skyway.fish

    # PowerShell
    skyway completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn up_flags() {
        let cli = Cli::try_parse_from(["skyway", "up", "web", "-e", "staging", "-s", "api", "-d"])
            .unwrap();
        match cli.command {
            Command::Up {
                path,
                environment,
                service,
                detach,
            } => {
                assert_eq!(path, Some(PathBuf::from("web")));
                assert_eq!(environment.as_deref(), Some("staging"));
                assert_eq!(service.as_deref(), Some("api"));
                assert!(detach);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["skyway", "up", "--verbose", "--no-interactive"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.interactive());
    }

    #[test]
    fn logs_default_lines() {
        let cli = Cli::try_parse_from(["skyway", "logs"]).unwrap();
        assert!(matches!(cli.command, Command::Logs { lines: 1000, .. }));
    }

    #[test]
    fn link_requires_project() {
        assert!(Cli::try_parse_from(["skyway", "link"]).is_err());
    }
}
