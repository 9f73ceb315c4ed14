//! `local-server cli`: Run WP-CLI in the PHP container.

use std::path::Path;

use clap::Args;

use super::exec;

/// Arguments for the `cli` command.
#[derive(Args, Debug)]
pub struct CliArgs {
    /// Arguments passed to `wp`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes the `cli` command.
///
/// # Errors
///
/// Returns an error if the container is not running or `wp` fails.
pub fn execute(root: &Path, args: CliArgs) -> anyhow::Result<()> {
    let mut command = vec!["wp".to_string()];
    command.extend(args.args);
    exec::run_in_php(root, &command)
}
