//! Process plumbing: the resolved project, the docker compose invocation
//! and its environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, bail};
use local_server_common::config::EnvironmentOverrides;
use local_server_common::constants::{self, PROXY_COMPOSE_FILE};
use local_server_common::types::GeneratorArgs;
use local_server_compose::{ExtensionRegistry, Generator, ProjectConfig};

/// Seconds docker compose waits on the engine before giving up.
const CLIENT_TIMEOUT_SECS: u32 = 120;

/// A project with its resolved configuration.
#[derive(Debug)]
pub struct Project {
    /// Project root.
    pub root: PathBuf,
    /// Resolved configuration.
    pub config: ProjectConfig,
}

impl Project {
    /// A generator for the project at `root`.
    pub fn generator(root: &Path, args: GeneratorArgs) -> Generator {
        Generator::new(
            root,
            args,
            EnvironmentOverrides::from_env(),
            ExtensionRegistry::new(),
        )
    }

    /// Resolves the project at `root` with the given runtime switches.
    ///
    /// # Errors
    ///
    /// Returns an error if `composer.json` cannot be read or resolved.
    pub fn load(root: &Path, args: GeneratorArgs) -> anyhow::Result<Self> {
        let config = Self::generator(root, args)
            .resolve()
            .with_context(|| format!("cannot resolve project at {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    /// The `vendor` directory compose runs from.
    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join("vendor")
    }

    /// The generated compose file.
    pub fn compose_file(&self) -> PathBuf {
        constants::compose_file(&self.root)
    }

    /// Whether the generated document uses synchronized file sharing.
    pub fn uses_sync(&self) -> bool {
        std::fs::read_to_string(self.compose_file())
            .is_ok_and(|text| text.lines().any(|l| l.starts_with("x-mutagen:")))
    }

    /// The site's base URL.
    pub fn site_url(&self) -> String {
        format!("{}://{}/", self.config.scheme(), self.config.hostname)
    }

    /// Name of the container running `service`.
    pub fn container(&self, service: &str) -> String {
        self.config.container_name(service)
    }
}

/// Variables passed to every compose invocation.
pub fn compose_env(config: &ProjectConfig) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    let _ = env.insert("VOLUME".into(), config.root_str());
    let _ = env.insert("COMPOSE_PROJECT_NAME".into(), config.name.clone());
    let _ = env.insert(
        "DOCKER_CLIENT_TIMEOUT".into(),
        CLIENT_TIMEOUT_SECS.to_string(),
    );
    let _ = env.insert(
        "COMPOSE_HTTP_TIMEOUT".into(),
        CLIENT_TIMEOUT_SECS.to_string(),
    );
    let _ = env.insert(
        constants::ES_MEM_LIMIT_ENV.into(),
        config.overrides.es_mem_limit.clone(),
    );
    env
}

/// Which compose front end to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    /// `docker compose`.
    Plugin,
    /// Legacy standalone `docker-compose`.
    Standalone,
    /// `mutagen-compose`, which also manages the sync sessions.
    Mutagen,
}

impl Frontend {
    /// Picks the front end available on this host.
    ///
    /// # Errors
    ///
    /// Returns an error if synchronized sharing is requested without
    /// `mutagen-compose`, or if no compose front end is installed.
    pub fn detect(sync: bool) -> anyhow::Result<Self> {
        if sync {
            if which::which("mutagen-compose").is_ok() {
                return Ok(Self::Mutagen);
            }
            bail!("synchronized file sharing needs mutagen-compose on the PATH");
        }
        if which::which("docker").is_ok() {
            return Ok(Self::Plugin);
        }
        if which::which("docker-compose").is_ok() {
            return Ok(Self::Standalone);
        }
        bail!("docker is not installed or not on the PATH")
    }

    fn program(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Plugin => ("docker", &["compose"]),
            Self::Standalone => ("docker-compose", &[]),
            Self::Mutagen => ("mutagen-compose", &[]),
        }
    }
}

/// A compose invocation bound to a working directory and environment.
#[derive(Debug)]
pub struct Compose {
    frontend: Frontend,
    workdir: PathBuf,
    file: Option<String>,
    env: BTreeMap<String, String>,
}

impl Compose {
    /// Compose for the project's own services.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable compose front end is installed.
    pub fn project(project: &Project) -> anyhow::Result<Self> {
        Ok(Self {
            frontend: Frontend::detect(project.uses_sync())?,
            workdir: project.vendor_dir(),
            file: None,
            env: compose_env(&project.config),
        })
    }

    /// Compose for the shared reverse proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if docker compose is not installed.
    pub fn proxy(project: &Project) -> anyhow::Result<Self> {
        Ok(Self {
            frontend: Frontend::detect(false)?,
            workdir: project.config.config_dir.clone(),
            file: Some(PROXY_COMPOSE_FILE.to_string()),
            env: BTreeMap::new(),
        })
    }

    /// Builds the command for `args` without running it.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let (program, prefix) = self.frontend.program();
        let mut command = Command::new(program);
        let _ = command.args(prefix).current_dir(&self.workdir).envs(&self.env);
        if let Some(file) = &self.file {
            let _ = command.args(["-f", file]);
        }
        let _ = command.args(args);
        command
    }

    /// Runs `args` with inherited stdio.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    pub fn run<I, S>(&self, args: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = self.command(args);
        tracing::debug!(command = ?command, "running compose");
        check(command.status().context("cannot launch docker compose")?)
    }

    /// Runs `args` and captures stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    pub fn output<I, S>(&self, args: I) -> anyhow::Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = self
            .command(args)
            .stderr(Stdio::inherit())
            .output()
            .context("cannot launch docker compose")?;
        check(output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Runs `docker` with inherited stdio.
///
/// # Errors
///
/// Returns an error if docker cannot be spawned or exits non-zero.
pub fn docker<I, S>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut command = Command::new("docker");
    let _ = command.args(args);
    tracing::debug!(command = ?command, "running docker");
    check(command.status().context("cannot launch docker")?)
}

/// Whether a container named exactly `name` is running.
pub fn is_running(name: &str) -> bool {
    Command::new("docker")
        .args(["ps", "-q", "--filter", &format!("name=^{name}$")])
        .stderr(Stdio::null())
        .output()
        .is_ok_and(|o| o.status.success() && !o.stdout.is_empty())
}

/// Converts a non-zero exit into an error carrying the exit code.
///
/// # Errors
///
/// Returns an error if `status` is not success.
pub fn check(status: ExitStatus) -> anyhow::Result<()> {
    if status.success() {
        Ok(())
    } else {
        match status.code() {
            Some(code) => bail!("command exited with status {code}"),
            None => bail!("command terminated by a signal"),
        }
    }
}

/// Terminal size forwarded into interactive containers.
pub fn terminal_env() -> Vec<String> {
    let columns = std::env::var("COLUMNS").unwrap_or_else(|_| "80".into());
    let lines = std::env::var("LINES").unwrap_or_else(|_| "24".into());
    vec![
        "-e".into(),
        format!("COLUMNS={columns}"),
        "-e".into(),
        format!("LINES={lines}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(root: &Path) -> Project {
        std::fs::write(
            root.join("composer.json"),
            r#"{"extra":{"altis":{"modules":{"local-server":{"name":"acme","domain":"test.dev"}}}}}"#,
        )
        .expect("write composer.json");
        Project::load(root, GeneratorArgs::default()).expect("load")
    }

    #[test]
    fn compose_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project(dir.path());
        let env = compose_env(&project.config);
        assert_eq!(env["COMPOSE_PROJECT_NAME"], "acme");
        assert_eq!(env["VOLUME"], dir.path().display().to_string());
        assert_eq!(env["DOCKER_CLIENT_TIMEOUT"], "120");
        assert_eq!(env["COMPOSE_HTTP_TIMEOUT"], "120");
        assert!(env.contains_key("ES_MEM_LIMIT"));
    }

    #[test]
    fn project_paths_and_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project(dir.path());
        assert_eq!(project.site_url(), "https://acme.test.dev/");
        assert_eq!(project.container("php"), "acme-php");
        assert_eq!(project.vendor_dir(), dir.path().join("vendor"));
        assert!(!project.uses_sync());
    }

    #[test]
    fn sync_is_detected_from_generated_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project(dir.path());
        std::fs::create_dir_all(project.vendor_dir()).expect("mkdir");
        std::fs::write(project.compose_file(), "services: {}\nx-mutagen:\n  sync: {}\n")
            .expect("write");
        assert!(project.uses_sync());
    }

    #[test]
    fn proxy_command_targets_proxy_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project(dir.path());
        let compose = Compose {
            frontend: Frontend::Plugin,
            workdir: project.config.config_dir.clone(),
            file: Some(PROXY_COMPOSE_FILE.into()),
            env: BTreeMap::new(),
        };
        let command = compose.command(["up", "-d"]);
        assert_eq!(command.get_program(), "docker");
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["compose", "-f", "proxy.yml", "up", "-d"]);
    }
}
