//! `local-server restart`: Restart services.

use std::path::Path;

use anyhow::Context;
use clap::Args;

use super::generate::{self, GeneratorFlags};
use crate::compose::{Compose, Project};
use crate::output;

/// Arguments for the `restart` command.
#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Service to restart. If omitted, restarts all.
    pub service: Option<String>,

    /// Runtime switches.
    #[command(flatten)]
    pub flags: GeneratorFlags,
}

/// Executes the `restart` command.
///
/// The compose file is regenerated first so configuration changes apply.
///
/// # Errors
///
/// Returns an error if generation or docker compose fails.
pub fn execute(root: &Path, args: RestartArgs) -> anyhow::Result<()> {
    tracing::info!("restarting");
    let project = Project::load(root, args.flags.to_args())?;
    generate::write(root, &args.flags)?;

    if let Err(e) = Compose::proxy(&project)?.run(["restart"]) {
        tracing::warn!(error = %e, "could not restart the shared proxy");
    }

    let mut compose_args = vec!["restart".to_string()];
    compose_args.extend(args.service);
    Compose::project(&project)?
        .run(&compose_args)
        .context("failed to restart services")?;

    output::started(&project);
    Ok(())
}
