//! `local-server start`: Generate the environment and start it.

use std::path::Path;

use anyhow::{Context, bail};
use clap::Args;
use local_server_common::constants::HOST_MARKER_FILE;

use super::generate::{self, GeneratorFlags};
use super::ssl;
use crate::compose::{Compose, Project};
use crate::output;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Runtime switches.
    #[command(flatten)]
    pub flags: GeneratorFlags,
}

/// Fails if the marker at `marker` records a hostname other than `hostname`.
///
/// A renamed project would otherwise leave the old containers orphaned.
///
/// # Errors
///
/// Returns an error describing the previous hostname.
pub fn check_host_marker(marker: &Path, hostname: &str) -> anyhow::Result<()> {
    match std::fs::read_to_string(marker) {
        Ok(previous) if !previous.trim().is_empty() && previous.trim() != hostname => bail!(
            "detected changed domain ({} -> {hostname}); proceeding would orphan the old containers. \
             Revert the name change and destroy the old environment first",
            previous.trim()
        ),
        _ => Ok(()),
    }
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if generation fails, the hostname changed since the last
/// start, or any container fails to start.
pub fn execute(root: &Path, args: StartArgs) -> anyhow::Result<()> {
    tracing::info!("starting");
    let project = Project::load(root, args.flags.to_args())?;
    let marker = root.join(HOST_MARKER_FILE);
    check_host_marker(&marker, &project.config.hostname)?;

    generate::write(root, &args.flags)?;

    if project.config.args.secure && !ssl::certificate_exists(root) {
        ssl::generate(&project, &[])?;
    }

    std::fs::write(&marker, &project.config.hostname)
        .with_context(|| format!("cannot write {}", marker.display()))?;

    Compose::proxy(&project)?
        .run(["up", "-d"])
        .context("could not start the shared proxy")?;
    Compose::project(&project)?
        .run(["up", "-d", "--remove-orphans"])
        .context("services failed to start")?;

    output::started(&project);
    Ok(())
}
