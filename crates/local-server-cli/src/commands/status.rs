//! `local-server status`: Show service state in startup order.

use std::path::Path;

use clap::Args;
use local_server_common::types::GeneratorArgs;
use local_server_compose::graph::DependencyGraph;

use crate::compose::{Compose, Project};
use crate::output;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only print the planned startup order; do not query docker.
    #[arg(long)]
    pub plan: bool,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Returns an error if generation or docker compose fails.
pub fn execute(root: &Path, args: StatusArgs) -> anyhow::Result<()> {
    let project = Project::load(root, GeneratorArgs::default())?;
    let document = Project::generator(root, GeneratorArgs::default()).generate_for(project.config.clone())?;
    let order = DependencyGraph::from_document(&document)?.startup_order()?;

    println!("{}", output::plan(&project, &document, &order));
    if args.plan {
        return Ok(());
    }
    Compose::project(&project)?.run(["ps"])
}
