//! `local-server import-uploads`: Copy `content/uploads` into the S3 bucket.

use std::path::Path;

use clap::Args;
use local_server_common::constants::{S3_ACCESS_KEY, S3_SECRET_KEY};
use local_server_common::types::GeneratorArgs;
use local_server_compose::services::s3;

use crate::compose::{self, Project};

/// Arguments for the `import-uploads` command.
#[derive(Args, Debug)]
pub struct ImportUploadsArgs {}

/// `docker run` arguments for a one-shot minio client mirroring the host
/// uploads directory into the project bucket.
pub fn mirror_args(project: &Project) -> Vec<String> {
    let config = &project.config;
    let mut args = vec!["run".to_string(), "--rm".to_string()];
    args.extend(compose::terminal_env());
    args.extend([
        "-e".to_string(),
        format!("MC_HOST_local=http://{S3_ACCESS_KEY}:{S3_SECRET_KEY}@s3:9000"),
        format!(
            "--volume={}/content/uploads:/content/uploads:delegated",
            project.root.display()
        ),
        format!("--network={}_default", config.name),
        s3::CLIENT_IMAGE.to_string(),
        "mirror".to_string(),
        "--overwrite".to_string(),
        "--exclude".to_string(),
        ".*".to_string(),
        "/content".to_string(),
        format!("local/{}", config.bucket()),
    ]);
    args
}

/// Executes the `import-uploads` command.
///
/// # Errors
///
/// Returns an error if object storage is disabled or the mirror fails.
pub fn execute(root: &Path, _args: ImportUploadsArgs) -> anyhow::Result<()> {
    let project = Project::load(root, GeneratorArgs::default())?;
    if !project.config.features.s3 {
        anyhow::bail!("object storage is disabled for this project");
    }
    tracing::info!(bucket = %project.config.bucket(), "importing uploads");
    compose::docker(mirror_args(&project))?;
    tracing::info!("uploads imported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_host_uploads_into_project_bucket() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("composer.json"),
            r#"{"extra":{"altis":{"modules":{"local-server":{"name":"acme"}}}}}"#,
        )
        .expect("write");
        let project = Project::load(dir.path(), GeneratorArgs::default()).expect("load");
        let args = mirror_args(&project);

        assert_eq!(args[..2], ["run", "--rm"]);
        assert!(args.contains(&"MC_HOST_local=http://admin:password@s3:9000".to_string()));
        assert!(args.contains(&"--network=acme_default".to_string()));
        assert!(args.contains(&format!(
            "--volume={}/content/uploads:/content/uploads:delegated",
            dir.path().display()
        )));
        let image = args
            .iter()
            .position(|a| a == s3::CLIENT_IMAGE)
            .expect("client image");
        assert_eq!(
            args[image + 1..],
            ["mirror", "--overwrite", "--exclude", ".*", "/content", "local/s3-acme"]
        );
    }
}
