//! `local-server shell`: Open a shell in the PHP container.

use std::path::Path;

use clap::Args;
use local_server_common::types::GeneratorArgs;

use crate::compose::{self, Compose, Project};

/// Arguments for the `shell` command.
#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Shell to run.
    #[arg(long, default_value = "/bin/bash")]
    pub shell: String,
}

/// Executes the `shell` command.
///
/// # Errors
///
/// Returns an error if the PHP container cannot be found or the shell fails.
pub fn execute(root: &Path, args: ShellArgs) -> anyhow::Result<()> {
    let project = Project::load(root, GeneratorArgs::default())?;
    let id = Compose::project(&project)?.output(["ps", "-q", "php"])?;
    let id = id.trim();
    if id.is_empty() {
        anyhow::bail!("PHP container is not running; run `local-server start` first");
    }
    let mut docker_args = vec!["exec".to_string(), "-it".to_string()];
    docker_args.extend(compose::terminal_env());
    docker_args.extend([id.to_string(), args.shell]);
    compose::docker(docker_args)
}
