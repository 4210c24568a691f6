//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$SKYWAY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/skyway/config.toml`
//! 3. `~/.skyway/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing: the API URL must be http(s)
//! and every linked project must carry a valid project id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::ProjectId;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// token = "sk_live_..."
/// api_url = "https://api.skyway.dev/v1"
///
/// [projects."/home/ada/code/shop"]
/// project = "prj_8f2c"
/// environment = "staging"
/// service = "web"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Session token for the platform API
    pub token: Option<String>,

    /// API base URL override
    pub api_url: Option<String>,

    /// Linked projects keyed by absolute directory path
    pub projects: BTreeMap<String, LinkedProject>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api_url {
            validate_api_url(url)?;
        }

        for (path, linked) in &self.projects {
            ProjectId::new(linked.project.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("linked project for '{}': {}", path, e))
            })?;
            if linked.environment.as_deref() == Some("") {
                return Err(ConfigError::InvalidValue(format!(
                    "linked environment for '{}' cannot be empty",
                    path
                )));
            }
        }

        Ok(())
    }
}

/// A directory linked to a platform project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LinkedProject {
    /// Project id on the platform
    pub project: String,

    /// Default environment name for this directory
    pub environment: Option<String>,

    /// Default service name for this directory
    pub service: Option<String>,
}

/// Check that an API URL is an http(s) URL.
pub(crate) fn validate_api_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "invalid api_url '{}', must start with http:// or https://",
            url
        )))
    }
}
