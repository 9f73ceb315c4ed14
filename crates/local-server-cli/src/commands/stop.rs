//! `local-server stop`: Stop services.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use local_server_common::types::GeneratorArgs;

use crate::compose::{Compose, Project};

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Service to stop. If omitted, stops all.
    pub service: Option<String>,

    /// Also stop the shared proxy (ignored when stopping one service).
    #[arg(long)]
    pub clean: bool,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if docker compose fails.
pub fn execute(root: &Path, args: StopArgs) -> anyhow::Result<()> {
    tracing::info!("stopping");
    let project = Project::load(root, GeneratorArgs::default())?;
    let mut compose_args = vec!["stop".to_string()];
    compose_args.extend(args.service.clone());
    Compose::project(&project)?
        .run(&compose_args)
        .context("failed to stop services")?;

    if args.service.is_none() && args.clean {
        tracing::info!("stopping proxy container");
        Compose::proxy(&project)?.run(["stop"])?;
    }
    tracing::info!("stopped");
    Ok(())
}
