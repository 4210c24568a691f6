//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Skyway has one configuration file (user scope) plus a handful of
//! environment variables. Both are read once per invocation; the result is
//! immutable afterwards.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Environment variables
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$SKYWAY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/skyway/config.toml`
//! 3. `~/.skyway/config.toml` (canonical write location)
//!
//! # Environment Variables
//!
//! - `SKYWAY_TOKEN` - session token (overrides the config file token)
//! - `SKYWAY_PROJECT_TOKEN` - token scoped to a single project
//! - `SKYWAY_PROJECT_ID` - project to deploy; disables directory linking
//! - `SKYWAY_API_URL` - API base URL override
//!
//! # Example
//!
//! ```no_run
//! use skyway::core::config::{Config, EnvOverrides};
//! use std::path::Path;
//!
//! let config = Config::load().unwrap();
//! let env = EnvOverrides::from_env();
//! let project = config.project_config(&env, Path::new("/work/app")).unwrap();
//! println!("Deploying project {}", project.project_id);
//! ```

pub mod schema;

pub use schema::{GlobalConfig, LinkedProject};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::ProjectId;

/// Default platform API base URL.
pub const DEFAULT_API_URL: &str = "https://api.skyway.dev/v1";

/// Default environment name when neither a flag nor a link names one.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,

    #[error("no project linked to '{}'. Run `skyway link <PROJECT_ID>` first.", cwd.display())]
    NoLinkedProject { cwd: PathBuf },
}

/// Environment variable overrides, captured once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `SKYWAY_TOKEN`
    pub token: Option<String>,
    /// `SKYWAY_PROJECT_TOKEN`
    pub project_token: Option<String>,
    /// `SKYWAY_PROJECT_ID`
    pub project_id: Option<String>,
    /// `SKYWAY_API_URL`
    pub api_url: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            token: var("SKYWAY_TOKEN"),
            project_token: var("SKYWAY_PROJECT_TOKEN"),
            project_id: var("SKYWAY_PROJECT_ID"),
            api_url: var("SKYWAY_API_URL"),
        }
    }
}

/// Credentials presented to the platform API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Interactive user session
    Session(String),
    /// Token scoped to one project
    Project(String),
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Session(_) => write!(f, "Credentials::Session(..)"),
            Credentials::Project(_) => write!(f, "Credentials::Project(..)"),
        }
    }
}

/// The active project for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project to deploy
    pub project_id: ProjectId,
    /// Linked directory, or `None` when the project came from the environment
    /// (the current working directory is then the upload root)
    pub project_path: Option<PathBuf>,
    /// Linked default environment name
    pub environment: Option<String>,
    /// Linked default service name
    pub service: Option<String>,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    /// A missing config file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_global()? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let global = Self::read_global_config(path)?;
        global.validate()?;
        Ok(Config {
            global,
            global_path: Some(path.to_path_buf()),
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Result<Option<PathBuf>, ConfigError> {
        // 1. Check $SKYWAY_CONFIG
        if let Ok(path) = std::env::var("SKYWAY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/skyway/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("skyway/config.toml");
            if path.exists() {
                return Ok(Some(path));
            }
        }

        // 3. Check ~/.skyway/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".skyway/config.toml");
            if path.exists() {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    /// Read and parse a global config file.
    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical write path for global config.
    ///
    /// Returns `$SKYWAY_CONFIG` when set, otherwise `~/.skyway/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("SKYWAY_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".skyway/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Writes to a temp file in the
    /// same directory and renames it over the target.
    pub fn write_to(path: &Path, config: &GlobalConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Link a directory to a project, replacing any previous link for it.
    pub fn link(&mut self, dir: &Path, linked: LinkedProject) {
        self.global
            .projects
            .insert(dir.to_string_lossy().into_owned(), linked);
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Resolve the active project for a working directory.
    ///
    /// `SKYWAY_PROJECT_ID` wins and yields a config without a project path.
    /// Otherwise the linked directory that is the closest ancestor of `cwd`
    /// (or `cwd` itself) is used.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` if the project id is malformed
    /// - `ConfigError::NoLinkedProject` if nothing applies to `cwd`
    pub fn project_config(
        &self,
        env: &EnvOverrides,
        cwd: &Path,
    ) -> Result<ProjectConfig, ConfigError> {
        if let Some(id) = &env.project_id {
            let project_id = ProjectId::new(id.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("SKYWAY_PROJECT_ID: {}", e))
            })?;
            return Ok(ProjectConfig {
                project_id,
                project_path: None,
                environment: None,
                service: None,
            });
        }

        let best = self
            .global
            .projects
            .iter()
            .map(|(path, linked)| (PathBuf::from(path), linked))
            .filter(|(path, _)| cwd.starts_with(path))
            .max_by_key(|(path, _)| path.components().count());

        match best {
            Some((path, linked)) => Ok(ProjectConfig {
                project_id: ProjectId::new(linked.project.as_str())
                    .map_err(|e| ConfigError::InvalidValue(e.to_string()))?,
                project_path: Some(path),
                environment: linked.environment.clone(),
                service: linked.service.clone(),
            }),
            None => Err(ConfigError::NoLinkedProject {
                cwd: cwd.to_path_buf(),
            }),
        }
    }

    /// Get the API base URL.
    ///
    /// Defaults to [`DEFAULT_API_URL`] if not configured.
    pub fn api_url(&self, env: &EnvOverrides) -> String {
        env.api_url
            .as_deref()
            .or(self.global.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Get the credentials to present to the API.
    ///
    /// A project token beats a session token; the environment beats the file.
    pub fn credentials(&self, env: &EnvOverrides) -> Option<Credentials> {
        if let Some(token) = &env.project_token {
            return Some(Credentials::Project(token.clone()));
        }
        env.token
            .clone()
            .or_else(|| self.global.token.clone())
            .map(Credentials::Session)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}
