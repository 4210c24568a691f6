//! core::types
//!
//! Strong types for the deployment domain.
//!
//! # Types
//!
//! - [`ProjectId`], [`EnvironmentId`], [`ServiceId`], [`DeploymentId`] - Validated platform identifiers
//! - [`Environment`] - A named deployment namespace within a project
//! - [`Service`] - A deployable unit within a project
//! - [`Project`] - Read-only snapshot of a project and its services
//! - [`GitInfo`] - Best-effort source control provenance
//!
//! # Validation
//!
//! Identifiers are validated at construction time: they cannot be empty and
//! cannot contain whitespace or `/`, so they are always safe to splice into
//! an API path.
//!
//! # Examples
//!
//! ```
//! use skyway::core::types::{ProjectId, ServiceId};
//!
//! let project = ProjectId::new("prj_8f2c").unwrap();
//! assert_eq!(project.as_str(), "prj_8f2c");
//!
//! assert!(ServiceId::new("").is_err());
//! assert!(ServiceId::new("svc/../admin").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {kind} id: {reason}")]
    InvalidId {
        /// Which identifier was being built (e.g. "project")
        kind: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

fn validate_id(kind: &'static str, value: &str) -> Result<(), TypeError> {
    if value.is_empty() {
        return Err(TypeError::InvalidId {
            kind,
            reason: "cannot be empty".into(),
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TypeError::InvalidId {
            kind,
            reason: format!("'{}' contains whitespace", value),
        });
    }
    if value.contains('/') {
        return Err(TypeError::InvalidId {
            kind,
            reason: format!("'{}' contains '/'", value),
        });
    }
    Ok(())
}

macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new validated identifier.
            ///
            /// # Errors
            ///
            /// Returns `TypeError::InvalidId` if the value is empty or not path-safe.
            pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
                let value = value.into();
                validate_id($kind, &value)?;
                Ok(Self(value))
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

platform_id!(
    /// Identifier of a project on the platform.
    ProjectId,
    "project"
);

platform_id!(
    /// Identifier of an environment within a project.
    EnvironmentId,
    "environment"
);

platform_id!(
    /// Identifier of a service within a project.
    ServiceId,
    "service"
);

platform_id!(
    /// Identifier of a single deployment produced by an upload.
    DeploymentId,
    "deployment"
);

/// A deployment target namespace within a project (e.g. staging, production).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
}

/// A deployable unit within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
}

/// A read-only snapshot of a project, fetched once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Services in platform order. Order matters for first-match lookups.
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Project {
    /// Find the first service with exactly this name.
    pub fn find_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Count services sharing this name.
    pub fn services_named(&self, name: &str) -> usize {
        self.services.iter().filter(|s| s.name == name).count()
    }
}

/// Latest commit of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    pub hash: String,
    pub message: String,
    pub author: String,
}

/// Source control provenance for an upload.
///
/// `is_repo == false` is a valid, non-fatal state. In that case the string
/// fields are empty and `error` explains why collection degraded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub is_repo: bool,
    pub repo_name: String,
    pub branch: String,
    pub commit: CommitMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GitInfo {
    /// Provenance for a directory that could not be read as a repository.
    pub fn not_a_repo(reason: impl Into<String>) -> Self {
        Self {
            is_repo: false,
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}
