//! CLI command definitions and dispatch.

pub mod cli;
pub mod db;
pub mod destroy;
pub mod exec;
pub mod generate;
pub mod import_uploads;
pub mod logs;
pub mod restart;
pub mod shell;
pub mod ssl;
pub mod start;
pub mod status;
pub mod stop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Local Server: docker-compose environment for Altis projects.
#[derive(Parser, Debug)]
#[command(name = "local-server", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Project root containing `composer.json`.
    #[arg(long, global = true, default_value = ".", env = "LOCAL_SERVER_ROOT")]
    pub root: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write `vendor/docker-compose.yml` without starting anything.
    Generate(generate::GenerateArgs),
    /// Generate the environment and start every service.
    Start(start::StartArgs),
    /// Stop all services, or one service.
    Stop(stop::StopArgs),
    /// Restart all services, or one service.
    Restart(restart::RestartArgs),
    /// Remove containers and volumes.
    Destroy(destroy::DestroyArgs),
    /// Show container status in startup order.
    Status(status::StatusArgs),
    /// Follow the logs of a service.
    Logs(logs::LogsArgs),
    /// Run a WP-CLI command in the PHP container.
    Cli(cli::CliArgs),
    /// Run an arbitrary command in the PHP container.
    Exec(exec::ExecArgs),
    /// Open a shell in the PHP container.
    Shell(shell::ShellArgs),
    /// Open a database client or print connection details.
    Db(db::DbArgs),
    /// Manage the local TLS certificate.
    Ssl(ssl::SslArgs),
    /// Copy `content/uploads` into the local S3 bucket.
    ImportUploads(import_uploads::ImportUploadsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let root = cli.root;
    match cli.command {
        Command::Generate(args) => generate::execute(&root, args),
        Command::Start(args) => start::execute(&root, args),
        Command::Stop(args) => stop::execute(&root, args),
        Command::Restart(args) => restart::execute(&root, args),
        Command::Destroy(args) => destroy::execute(&root, args),
        Command::Status(args) => status::execute(&root, args),
        Command::Logs(args) => logs::execute(&root, args),
        Command::Cli(args) => cli::execute(&root, args),
        Command::Exec(args) => exec::execute(&root, args),
        Command::Shell(args) => shell::execute(&root, args),
        Command::Db(args) => db::execute(&root, args),
        Command::Ssl(args) => ssl::execute(&root, args),
        Command::ImportUploads(args) => import_uploads::execute(&root, args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn start_accepts_bare_xdebug_flag() {
        let cli = Cli::try_parse_from(["local-server", "start", "--xdebug"]).expect("parse");
        match cli.command {
            Command::Start(args) => assert_eq!(args.flags.xdebug.as_deref(), Some("debug")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn start_accepts_xdebug_mode() {
        let cli = Cli::try_parse_from(["local-server", "start", "--xdebug=profile", "--tmp"])
            .expect("parse");
        match cli.command {
            Command::Start(args) => {
                assert_eq!(args.flags.xdebug.as_deref(), Some("profile"));
                assert!(args.flags.tmp);
                assert!(!args.flags.mutagen);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn wp_arguments_pass_through() {
        let cli = Cli::try_parse_from(["local-server", "cli", "--", "user", "list", "--format=json"])
            .expect("parse");
        match cli.command {
            Command::Cli(args) => assert_eq!(args.args, vec!["user", "list", "--format=json"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn import_uploads_is_kebab_case() {
        let cli = Cli::try_parse_from(["local-server", "import-uploads"]).expect("parse");
        assert!(matches!(cli.command, Command::ImportUploads(_)));
    }

    #[test]
    fn bare_ssl_has_no_action() {
        let cli = Cli::try_parse_from(["local-server", "ssl"]).expect("parse");
        assert!(matches!(cli.command, Command::Ssl(s) if s.action.is_none()));
    }

    #[test]
    fn logs_requires_service() {
        assert!(Cli::try_parse_from(["local-server", "logs"]).is_err());
        let cli = Cli::try_parse_from(["local-server", "logs", "php", "-f"]).expect("parse");
        assert!(matches!(cli.command, Command::Logs(l) if l.follow && l.service == "php"));
    }
}
