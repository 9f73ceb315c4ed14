//! Shared fixtures for the generator integration tests.

#![allow(dead_code)]

use std::path::Path;

use local_server_common::config::EnvironmentOverrides;
use local_server_common::types::GeneratorArgs;
use local_server_compose::extension::ExtensionRegistry;
use local_server_compose::generator::Generator;
use local_server_compose::resolver::{self, ProjectConfig};
use local_server_compose::settings::ProjectSettings;

/// Wraps a `local-server` block and optional sibling module blocks into a
/// `composer.json` document.
pub fn composer_json(local_server: &str, siblings: &str) -> String {
    let siblings = if siblings.is_empty() {
        String::new()
    } else {
        format!(",{siblings}")
    };
    format!(
        r#"{{"extra":{{"altis":{{"modules":{{"local-server":{local_server}{siblings}}}}}}}}}"#
    )
}

/// Writes `composer.json` into `root`.
pub fn write_project(root: &Path, local_server: &str, siblings: &str) {
    std::fs::write(root.join("composer.json"), composer_json(local_server, siblings))
        .expect("write composer.json");
}

/// Resolves a configuration without touching the filesystem.
pub fn resolve(local_server: &str, siblings: &str, args: GeneratorArgs) -> ProjectConfig {
    let text = composer_json(local_server, siblings);
    let settings =
        ProjectSettings::from_json(&text, Path::new("composer.json")).expect("parse settings");
    resolver::resolve(
        &settings,
        Path::new("/srv/acme"),
        args,
        EnvironmentOverrides::default(),
    )
    .expect("resolve")
}

/// A generator for `root` with default arguments.
pub fn generator(root: &Path, args: GeneratorArgs, registry: ExtensionRegistry) -> Generator {
    Generator::new(root, args, EnvironmentOverrides::default(), registry)
}

/// A `local-server` block enabling every optional service.
pub const EVERYTHING: &str = r#"{
    "name": "acme", "domain": "test.dev",
    "domains": ["acme.example"],
    "elasticsearch": "7.10", "kibana": true, "analytics": true,
    "nodejs": {"path": "apps/web", "version": "18"}
}"#;
