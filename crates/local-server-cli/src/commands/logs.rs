//! `local-server logs`: View service logs.

use std::path::Path;

use clap::Args;
use local_server_common::types::GeneratorArgs;

use crate::compose::{Compose, Project};

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Service name (`php`, `nginx`, `db`, ...).
    pub service: String,

    /// Follow log output.
    #[arg(short, long)]
    pub follow: bool,

    /// Number of lines to show from the end.
    #[arg(long, default_value_t = 100)]
    pub tail: u32,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if docker compose fails.
pub fn execute(root: &Path, args: LogsArgs) -> anyhow::Result<()> {
    let project = Project::load(root, GeneratorArgs::default())?;
    let mut compose_args = vec!["logs".to_string(), format!("--tail={}", args.tail)];
    if args.follow {
        compose_args.push("-f".into());
    }
    compose_args.push(args.service);
    Compose::project(&project)?.run(&compose_args)
}
