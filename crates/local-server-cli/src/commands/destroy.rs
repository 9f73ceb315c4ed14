//! `local-server destroy`: Remove containers and volumes.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use local_server_common::constants::HOST_MARKER_FILE;
use local_server_common::types::GeneratorArgs;

use super::ssl;
use crate::compose::{Compose, Project};

/// Arguments for the `destroy` command.
#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Also remove the shared proxy.
    #[arg(long)]
    pub clean: bool,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

/// Asks a yes/no question on the terminal, defaulting to no.
fn confirm(question: &str) -> anyhow::Result<bool> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{question} [y/N] ")?;
    stdout.flush()?;
    let mut answer = String::new();
    let _ = std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Executes the `destroy` command.
///
/// # Errors
///
/// Returns an error if docker compose fails.
pub fn execute(root: &Path, args: DestroyArgs) -> anyhow::Result<()> {
    if !args.yes && !confirm("Are you sure you want to destroy the server?")? {
        return Ok(());
    }
    tracing::info!("destroying");
    let project = Project::load(root, GeneratorArgs::default())?;
    let result = Compose::project(&project)?
        .run(["down", "-v", "--remove-orphans"])
        .context("failed to destroy services");

    let remove_proxy = args.clean
        || (!args.yes
            && confirm(
                "Do you want to remove the shared proxy container too?\n\
                 Warning: only do this if you have no other instances of Local Server.",
            )?);
    if remove_proxy {
        tracing::info!("destroying proxy container");
        Compose::proxy(&project)?.run(["down", "-v"])?;
    }

    for path in [
        root.join(HOST_MARKER_FILE),
        ssl::cert_file(root),
        ssl::key_file(root),
    ] {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "nothing to remove");
        }
    }

    result?;
    tracing::info!("destroyed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }
}
