//! cli::commands::link
//!
//! Record the working directory as a linked project in the global config.

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, LinkedProject};
use crate::core::types::ProjectId;

/// Run the `link` command.
pub fn link(
    ctx: &Context,
    project_id: &str,
    environment: Option<String>,
    service: Option<String>,
) -> Result<()> {
    let project_id = ProjectId::new(project_id)?;
    let cwd = ctx.cwd()?;
    let path = Config::global_config_path()?;

    let mut config = if path.exists() {
        Config::load_from(&path)?
    } else {
        Config::default()
    };

    config.link(
        &cwd,
        LinkedProject {
            project: project_id.to_string(),
            environment: environment.filter(|e| !e.is_empty()),
            service: service.filter(|s| !s.is_empty()),
        },
    );
    Config::write_to(&path, &config.global)
        .with_context(|| format!("failed to save link for {}", cwd.display()))?;

    println!("Linked {} to project {}", cwd.display(), project_id);
    Ok(())
}
