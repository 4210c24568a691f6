//! deploy::resolver
//!
//! Resolves which environment and service an upload targets.
//!
//! # Algorithm
//!
//! 1. Resolve the environment by exact name
//! 2. Fetch the project once
//! 3. With a service name, take the first exact match and never prompt
//! 4. Without one, ask the [`ServicePrompt`]; "no selection" is valid and
//!    leaves the service for the platform to infer
//!
//! Only remote reads happen here.

use crate::backend::{Backend, BackendError};
use crate::core::types::{Environment, Project, ProjectId, Service};
use crate::ui::prompts::ServicePrompt;

use super::error::DeployError;
use super::trace::Tracer;

/// What the caller asked to deploy to.
#[derive(Debug, Clone, Copy)]
pub struct TargetRequest<'a> {
    pub project_id: &'a ProjectId,
    /// Already defaulted; never empty
    pub environment: &'a str,
    pub service: Option<&'a str>,
}

/// A fully resolved deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub project: Project,
    pub environment: Environment,
    /// `None` lets the platform infer the service
    pub service: Option<Service>,
}

/// Resolve `request` against the platform.
///
/// # Errors
///
/// - `TargetNotFound` if no environment has the requested name
/// - `ServiceNotFound` if a service name was given and nothing matches
/// - `Cancelled` if the operator aborts the prompt
pub async fn resolve_target(
    backend: &dyn Backend,
    prompt: &dyn ServicePrompt,
    tracer: &dyn Tracer,
    request: TargetRequest<'_>,
) -> Result<Target, DeployError> {
    tracer.trace("Loading environment");
    let environment = backend
        .resolve_environment(request.project_id, request.environment)
        .await
        .map_err(|e| match e {
            BackendError::NotFound(_) => DeployError::TargetNotFound {
                name: request.environment.to_string(),
            },
            other => DeployError::backend("resolve environment", other),
        })?;
    tracer.trace(&format!("Using environment {}", environment.name));

    tracer.trace("Loading project");
    let project = backend
        .get_project(request.project_id)
        .await
        .map_err(|e| DeployError::backend("load project", e))?;

    tracer.trace("Loading services");
    let service = match request.service {
        Some(name) => Some(service_by_name(&project, name)?),
        None => prompt.select(&project.services)?,
    };

    match &service {
        Some(s) => tracer.trace(&format!("Using service {}", s.name)),
        None => tracer.trace("No service selected; the platform will infer one"),
    }

    Ok(Target {
        project,
        environment,
        service,
    })
}

/// First service named `name`.
fn service_by_name(project: &Project, name: &str) -> Result<Service, DeployError> {
    let service = project
        .find_service(name)
        .cloned()
        .ok_or_else(|| DeployError::ServiceNotFound {
            name: name.to_string(),
        })?;

    let count = project.services_named(name);
    if count > 1 {
        tracing::warn!(
            service = name,
            count,
            chosen = %service.id,
            "several services share this name; using the first"
        );
    }
    Ok(service)
}
