//! # local-server: Local Server CLI
//!
//! Generates the docker-compose environment for an Altis project and drives
//! its container lifecycle.

mod commands;
mod compose;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    commands::execute(cli)
}
