//! `local-server ssl`: Local TLS certificate via mkcert.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use clap::{Args, Subcommand};
use local_server_common::constants::DEFAULT_TLD;
use local_server_common::types::GeneratorArgs;

use crate::compose::{self, Compose, Project};

/// Arguments for the `ssl` command.
#[derive(Args, Debug)]
pub struct SslArgs {
    /// What to do; without one, reports whether the certificate exists.
    #[command(subcommand)]
    pub action: Option<SslAction>,
}

/// Certificate actions.
#[derive(Subcommand, Debug)]
pub enum SslAction {
    /// Install and trust the mkcert root certificate.
    Install,
    /// Generate the certificate for every project hostname.
    Generate {
        /// Extra names to include.
        domains: Vec<String>,
    },
    /// Run an arbitrary mkcert command.
    Exec {
        /// Arguments passed to mkcert.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
}

/// Certificate written by `generate`.
pub fn cert_file(root: &Path) -> PathBuf {
    root.join("vendor").join("ssl-cert.pem")
}

/// Key written by `generate`.
pub fn key_file(root: &Path) -> PathBuf {
    root.join("vendor").join("ssl-key.pem")
}

/// Whether both the certificate and its key have been generated.
pub fn certificate_exists(root: &Path) -> bool {
    cert_file(root).is_file() && key_file(root).is_file()
}

/// Locates mkcert on the `PATH` or in `vendor/`.
fn mkcert(root: &Path) -> anyhow::Result<PathBuf> {
    if let Ok(path) = which::which("mkcert") {
        return Ok(path);
    }
    let local = root.join("vendor").join("mkcert");
    if local.is_file() {
        return Ok(local);
    }
    bail!("mkcert is not installed; install it from https://github.com/FiloSottile/mkcert")
}

/// Every name the certificate covers, deduplicated in first-seen order.
pub fn certificate_names(project: &Project, extra: &[String]) -> Vec<String> {
    let mut names = vec![format!("*.{DEFAULT_TLD}")];
    names.extend(extra.iter().cloned());
    names.extend(project.config.all_hostnames());
    let mut seen = std::collections::HashSet::new();
    names.retain(|n| !n.is_empty() && seen.insert(n.clone()));
    names
}

fn run_mkcert<I, S>(root: &Path, args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut command = Command::new(mkcert(root)?);
    let _ = command.args(args).current_dir(root);
    tracing::debug!(command = ?command, "running mkcert");
    compose::check(command.status().context("cannot launch mkcert")?)
}

/// Generates the certificate and restarts the proxy if it is running.
///
/// # Errors
///
/// Returns an error if mkcert is missing or fails.
pub fn generate(project: &Project, extra: &[String]) -> anyhow::Result<()> {
    let root = &project.root;
    std::fs::create_dir_all(root.join("vendor")).context("cannot create vendor directory")?;
    let mut args = vec![
        "-cert-file".to_string(),
        cert_file(root).display().to_string(),
        "-key-file".to_string(),
        key_file(root).display().to_string(),
    ];
    args.extend(certificate_names(project, extra));
    run_mkcert(root, &args).context("could not generate certificates")?;
    tracing::info!("generated SSL certificate");

    if compose::is_running("altis-proxy") {
        tracing::info!("restarting proxy to activate the new certificate");
        Compose::proxy(project)?.run(["restart"])?;
    }
    Ok(())
}

/// Executes the `ssl` command.
///
/// # Errors
///
/// Returns an error if mkcert is missing or fails, or, without an action,
/// if the certificate has not been generated.
pub fn execute(root: &Path, args: SslArgs) -> anyhow::Result<()> {
    let Some(action) = args.action else {
        if !certificate_exists(root) {
            bail!("certificate file does not exist; run `local-server ssl generate` to create one");
        }
        tracing::info!(path = %cert_file(root).display(), "certificate file exists");
        return Ok(());
    };
    match action {
        SslAction::Install => {
            run_mkcert(root, ["-install"]).context("could not install the mkcert root CA")?;
            tracing::info!("mkcert root CA installed");
            Ok(())
        }
        SslAction::Generate { domains } => {
            let project = Project::load(root, GeneratorArgs::default())?;
            generate(&project, &domains)
        }
        SslAction::Exec { args } => run_mkcert(root, &args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_covers_project_and_auxiliary_hosts() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("composer.json"),
            r#"{"extra":{"altis":{"modules":{"local-server":{"name":"acme","domains":["acme.example"]}}}}}"#,
        )
        .expect("write");
        let project = Project::load(dir.path(), GeneratorArgs::default()).expect("load");
        let names = certificate_names(&project, &["*.altis.dev".into()]);
        assert_eq!(names[0], "*.altis.dev");
        assert_eq!(names.iter().filter(|n| *n == "*.altis.dev").count(), 1);
        for expected in [
            "acme.altis.dev",
            "*.acme.altis.dev",
            "s3-acme.altis.dev",
            "s3-console-acme.altis.dev",
            "cognito-acme.altis.dev",
            "pinpoint-acme.altis.dev",
            "elasticsearch-acme.altis.dev",
            "acme.example",
            "*.acme.example",
        ] {
            assert!(names.iter().any(|n| n == expected), "{expected} missing");
        }
    }

    #[test]
    fn bare_ssl_reports_missing_certificate() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!certificate_exists(dir.path()));
        assert!(execute(dir.path(), SslArgs { action: None }).is_err());

        std::fs::create_dir_all(dir.path().join("vendor")).expect("mkdir");
        std::fs::write(cert_file(dir.path()), "cert").expect("write cert");
        assert!(!certificate_exists(dir.path()));
        std::fs::write(key_file(dir.path()), "key").expect("write key");
        assert!(certificate_exists(dir.path()));
        execute(dir.path(), SslArgs { action: None }).expect("certificate exists");
    }

    #[test]
    fn certificate_paths_live_in_vendor() {
        let root = Path::new("/srv/acme");
        assert_eq!(cert_file(root), Path::new("/srv/acme/vendor/ssl-cert.pem"));
        assert_eq!(key_file(root), Path::new("/srv/acme/vendor/ssl-key.pem"));
    }
}
