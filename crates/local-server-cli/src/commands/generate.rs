//! `local-server generate`: Write the compose file.

use std::path::Path;

use clap::Args;
use local_server_common::types::{GeneratorArgs, XdebugMode};

use crate::compose::Project;

/// Runtime switches shared by every command that generates the document.
#[derive(Args, Debug, Clone, Default)]
pub struct GeneratorFlags {
    /// Enable Xdebug, optionally with a mode such as `profile` or `debug,profile`.
    #[arg(long, num_args = 0..=1, default_missing_value = "debug", value_name = "MODE")]
    pub xdebug: Option<String>,

    /// Share files through a synchronized volume (requires mutagen-compose).
    #[arg(long)]
    pub mutagen: bool,

    /// Bind the runtime `/tmp` to `<root>/.tmp`.
    #[arg(long)]
    pub tmp: bool,
}

impl GeneratorFlags {
    /// Converts the flags into generator arguments.
    pub fn to_args(&self) -> GeneratorArgs {
        GeneratorArgs {
            xdebug: self
                .xdebug
                .as_deref()
                .map_or_else(XdebugMode::off, XdebugMode::new),
            mutagen: self.mutagen,
            tmp: self.tmp,
            ..GeneratorArgs::default()
        }
    }
}

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Runtime switches.
    #[command(flatten)]
    pub flags: GeneratorFlags,

    /// Print the document instead of writing it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Writes `vendor/docker-compose.yml` for the project at `root`.
///
/// # Errors
///
/// Returns an error if generation or writing fails; nothing is written on a
/// generation failure.
pub fn write(root: &Path, flags: &GeneratorFlags) -> anyhow::Result<()> {
    let path = Project::generator(root, flags.to_args()).generate_to_file()?;
    tracing::info!(path = %path.display(), "generated compose file");
    Ok(())
}

/// Executes the `generate` command.
///
/// # Errors
///
/// Returns an error if generation or writing fails.
pub fn execute(root: &Path, args: GenerateArgs) -> anyhow::Result<()> {
    if args.dry_run {
        let document = Project::generator(root, args.flags.to_args()).generate()?;
        print!("{}", local_server_compose::serializer::serialize(&document)?);
        return Ok(());
    }
    write(root, &args.flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_generator_args() {
        let args = GeneratorFlags {
            xdebug: Some("profile".into()),
            mutagen: true,
            tmp: false,
        }
        .to_args();
        assert!(args.xdebug.includes_profiling());
        assert!(args.mutagen);
        assert!(args.secure);
        assert!(!GeneratorFlags::default().to_args().xdebug.is_enabled());
    }

    #[test]
    fn write_creates_compose_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), &GeneratorFlags::default()).expect("generate");
        assert!(dir.path().join("vendor/docker-compose.yml").is_file());
    }
}
