//! YAML rendering of the environment document.

use std::path::Path;

use local_server_common::error::{LocalServerError, Result};

use crate::model::EnvironmentDocument;

/// Renders `document` as YAML.
///
/// Identical documents render to identical bytes.
///
/// # Errors
///
/// Returns [`LocalServerError::Serialization`] if rendering fails.
pub fn serialize(document: &EnvironmentDocument) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Renders `document` and writes it to `path`, creating the parent
/// directory.
///
/// The document is fully rendered before the file is touched, so a
/// rendering failure leaves any existing file unchanged.
///
/// # Errors
///
/// Returns a serialization error or [`LocalServerError::Io`].
pub fn write(document: &EnvironmentDocument, path: &Path) -> Result<()> {
    let text = serialize(document)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LocalServerError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| LocalServerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote environment document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NetworkDefinition, ServiceDefinition};

    fn document() -> EnvironmentDocument {
        let mut doc = EnvironmentDocument::default();
        let _ = doc.services.insert(
            "redis".into(),
            ServiceDefinition::new("redis", "redis:7.2-alpine").port(6379),
        );
        let _ = doc.networks.insert("default".into(), None);
        let _ = doc.networks.insert(
            "proxy".into(),
            Some(NetworkDefinition {
                name: "proxy".into(),
                external: true,
            }),
        );
        doc
    }

    #[test]
    fn renders_compose_layout() {
        let yaml = serialize(&document()).expect("serialize");
        assert!(yaml.starts_with("services:\n  redis:\n    image: redis:7.2-alpine\n"), "got:\n{yaml}");
        assert!(yaml.contains("networks:\n  default: null\n  proxy:\n    name: proxy\n    external: true\n"));
        assert!(!yaml.contains("x-mutagen"));
    }

    #[test]
    fn rendering_is_stable() {
        assert_eq!(
            serialize(&document()).expect("first"),
            serialize(&document()).expect("second")
        );
    }

    #[test]
    fn write_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vendor").join("docker-compose.yml");
        write(&document(), &path).expect("write");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(text, serialize(&document()).expect("serialize"));
    }
}
