//! `local-server db`: Database client and connection details.

use std::path::Path;

use clap::{Args, Subcommand};
use local_server_common::types::GeneratorArgs;

use crate::compose::{self, Compose, Project};
use crate::output;

/// Arguments for the `db` command.
#[derive(Args, Debug)]
pub struct DbArgs {
    /// What to do; opens an interactive client when omitted.
    #[command(subcommand)]
    pub action: Option<DbAction>,
}

/// Database actions.
#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Print connection details.
    Info,
    /// Run one SQL query.
    Exec {
        /// The query.
        query: String,
    },
}

/// Terminates `query` with a semicolon.
pub fn terminated(query: &str) -> String {
    let query = query.trim();
    if query.ends_with(';') {
        query.to_string()
    } else {
        format!("{query};")
    }
}

/// Executes the `db` command.
///
/// # Errors
///
/// Returns an error if the database container is not reachable.
pub fn execute(root: &Path, args: DbArgs) -> anyhow::Result<()> {
    let project = Project::load(root, GeneratorArgs::default())?;
    if matches!(args.action, Some(DbAction::Info)) {
        let published = Compose::project(&project)?
            .output(["port", "db", "3306"])
            .ok();
        println!("{}", output::db_info(&project, published.as_deref()));
        return Ok(());
    }

    let mut docker_args = vec!["exec".to_string(), "-it".to_string(), "-u".into(), "root".into()];
    docker_args.extend(compose::terminal_env());
    docker_args.extend([
        "-e".to_string(),
        format!("MYSQL_PWD={}", local_server_common::constants::DB_CREDENTIAL),
        project.container("db"),
        "mysql".to_string(),
        "--database=wordpress".to_string(),
        "--user=root".to_string(),
    ]);
    if let Some(DbAction::Exec { query }) = args.action {
        docker_args.extend(["-e".to_string(), terminated(&query)]);
    }
    compose::docker(docker_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_are_terminated() {
        assert_eq!(terminated("select 1"), "select 1;");
        assert_eq!(terminated("select 1; "), "select 1;");
    }
}
