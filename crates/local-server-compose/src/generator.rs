//! End-to-end generation: settings, resolution, assembly, extensions,
//! validation, and rendering.

use std::path::{Path, PathBuf};

use local_server_common::config::EnvironmentOverrides;
use local_server_common::constants;
use local_server_common::error::Result;
use local_server_common::types::GeneratorArgs;

use crate::assembler::Assembler;
use crate::extension::ExtensionRegistry;
use crate::model::EnvironmentDocument;
use crate::resolver::{self, ProjectConfig};
use crate::serializer;
use crate::settings::ProjectSettings;

/// Generates the environment document for one project.
#[derive(Debug)]
pub struct Generator {
    root: PathBuf,
    args: GeneratorArgs,
    overrides: EnvironmentOverrides,
    registry: ExtensionRegistry,
}

impl Generator {
    /// Creates a generator for the project at `root`.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        args: GeneratorArgs,
        overrides: EnvironmentOverrides,
        registry: ExtensionRegistry,
    ) -> Self {
        Self {
            root: root.into(),
            args,
            overrides,
            registry,
        }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads `composer.json` and resolves the project configuration.
    ///
    /// # Errors
    ///
    /// Returns parse, I/O and configuration errors.
    pub fn resolve(&self) -> Result<ProjectConfig> {
        let settings = ProjectSettings::load(&self.root)?;
        self.resolve_settings(&settings)
    }

    /// Resolves already-loaded settings.
    ///
    /// # Errors
    ///
    /// Returns configuration errors.
    pub fn resolve_settings(&self, settings: &ProjectSettings) -> Result<ProjectConfig> {
        resolver::resolve(
            settings,
            &self.root,
            self.args.clone(),
            self.overrides.clone(),
        )
    }

    /// Produces the validated document from the project settings on disk.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any stage; nothing is written.
    pub fn generate(&self) -> Result<EnvironmentDocument> {
        let config = self.resolve()?;
        self.generate_for(config)
    }

    /// Produces the validated document for an already resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns unknown extension, builder, extension and validation errors.
    pub fn generate_for(&self, config: ProjectConfig) -> Result<EnvironmentDocument> {
        let mut extensions = self.registry.instantiate(&config.extensions)?;
        let mut assembler = Assembler::new(config);
        assembler.add_core_services()?;
        assembler.finish(&mut extensions)
    }

    /// Generates the document and writes it to `vendor/docker-compose.yml`.
    ///
    /// # Errors
    ///
    /// Returns any generation error, in which case no file is written, or an
    /// I/O error from writing.
    pub fn generate_to_file(&self) -> Result<PathBuf> {
        let document = self.generate()?;
        let path = constants::compose_file(&self.root);
        serializer::write(&document, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_composer(dir: &Path, local_server: &str) {
        let text = format!(
            r#"{{"extra":{{"altis":{{"modules":{{"local-server":{local_server}}}}}}}}}"#
        );
        std::fs::write(dir.join("composer.json"), text).expect("write composer.json");
    }

    fn generator(root: &Path) -> Generator {
        Generator::new(
            root,
            GeneratorArgs::default(),
            EnvironmentOverrides::default(),
            ExtensionRegistry::new(),
        )
    }

    #[test]
    fn generates_from_missing_project_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = generator(dir.path()).generate().expect("generate");
        assert!(doc.service("php").is_some());
        assert!(doc.service("nginx").is_some());
    }

    #[test]
    fn writes_compose_file_under_vendor() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_composer(dir.path(), r#"{"name":"acme"}"#);
        let path = generator(dir.path()).generate_to_file().expect("generate");
        assert_eq!(path, dir.path().join("vendor/docker-compose.yml"));
        let text = std::fs::read_to_string(path).expect("read");
        assert!(text.contains("container_name: acme-php"));
    }

    #[test]
    fn unknown_extension_aborts_before_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_composer(dir.path(), r#"{"extensions":["acme/missing"]}"#);
        let err = generator(dir.path()).generate_to_file().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(!dir.path().join("vendor/docker-compose.yml").exists());
    }
}
