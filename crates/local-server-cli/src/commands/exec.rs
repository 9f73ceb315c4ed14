//! `local-server exec`: Run a command in the PHP container.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::bail;
use clap::Args;
use local_server_common::types::GeneratorArgs;

use crate::compose::{self, Project};

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Command to execute.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// User the command runs as inside the container.
///
/// On Linux hosts files are bind-mounted with the host owner, so commands run
/// as the invoking user; elsewhere as the web server user.
fn container_user() -> String {
    if cfg!(target_os = "linux") {
        nix::unistd::getuid().as_raw().to_string()
    } else {
        "www-data".to_string()
    }
}

/// Builds the `docker exec` argument list.
pub fn exec_args(container: &str, user: &str, interactive: bool, command: &[String]) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    args.extend(compose::terminal_env());
    args.extend(["-u".to_string(), user.to_string()]);
    if interactive {
        args.push("-ti".into());
    }
    args.push(container.to_string());
    args.extend(command.iter().cloned());
    args
}

/// Runs `command` in the project's PHP container.
///
/// # Errors
///
/// Returns an error if the container is not running or the command fails.
pub fn run_in_php(root: &Path, command: &[String]) -> anyhow::Result<()> {
    let project = Project::load(root, GeneratorArgs::default())?;
    let container = project.container("php");
    if !compose::is_running(&container) {
        bail!(
            "PHP container {container} is not running; run `local-server start` first"
        );
    }
    let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    compose::docker(exec_args(&container, &container_user(), interactive, command))
}

/// Executes the `exec` command.
///
/// # Errors
///
/// Returns an error if the container is not running or the command fails.
pub fn execute(root: &Path, args: ExecArgs) -> anyhow::Result<()> {
    run_in_php(root, &args.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_exec_allocates_tty() {
        let args = exec_args("acme-php", "www-data", true, &["ls".into(), "-la".into()]);
        let tail: Vec<_> = args.iter().rev().take(4).rev().cloned().collect();
        assert_eq!(tail, vec!["-ti", "acme-php", "ls", "-la"]);
        assert_eq!(args[0], "exec");
        assert!(args.contains(&"www-data".to_string()));
    }

    #[test]
    fn piped_exec_skips_tty() {
        let args = exec_args("acme-php", "1000", false, &["wp".into()]);
        assert!(!args.contains(&"-ti".to_string()));
    }
}
