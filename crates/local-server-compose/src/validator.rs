//! Referential integrity checks on an assembled document.

use local_server_common::error::{LocalServerError, Result};

use crate::graph::DependencyGraph;
use crate::model::EnvironmentDocument;

/// Checks that `document` is internally consistent.
///
/// Every `depends_on` key must name a service in the document, every service
/// network must be declared, and the dependencies must be acyclic.
///
/// # Errors
///
/// Returns [`LocalServerError::Validation`] describing the first violation.
pub fn validate(document: &EnvironmentDocument) -> Result<()> {
    for (name, service) in &document.services {
        for network in &service.networks {
            if !document.networks.contains_key(network) {
                return Err(LocalServerError::validation(format!(
                    "service \"{name}\" joins undeclared network \"{network}\""
                )));
            }
        }
        for mount in &service.volumes {
            if mount.is_named_volume() && !document.volumes.contains_key(&mount.source) {
                return Err(LocalServerError::validation(format!(
                    "service \"{name}\" mounts undeclared volume \"{}\"",
                    mount.source
                )));
            }
        }
    }

    let graph = DependencyGraph::from_document(document)?;
    let order = graph.startup_order()?;
    tracing::debug!(services = order.len(), "document validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use local_server_common::types::DependencyCondition;

    use super::*;
    use crate::model::{Mount, ServiceDefinition};

    fn document(services: Vec<ServiceDefinition>) -> EnvironmentDocument {
        let mut doc = EnvironmentDocument::default();
        let _ = doc.networks.insert("default".into(), None);
        for service in services {
            let _ = doc.services.insert(service.name.clone(), service);
        }
        doc
    }

    #[test]
    fn consistent_document_passes() {
        let doc = document(vec![
            ServiceDefinition::new("db", "mysql").network("default"),
            ServiceDefinition::new("php", "php")
                .network("default")
                .depends_on("db", DependencyCondition::ServiceHealthy),
        ]);
        validate(&doc).expect("valid");
    }

    #[test]
    fn dangling_dependency_fails() {
        let doc = document(vec![
            ServiceDefinition::new("php", "php").depends_on("redis", DependencyCondition::ServiceStarted),
        ]);
        let err = validate(&doc).unwrap_err();
        assert!(matches!(err, LocalServerError::Validation { .. }));
        assert!(err.to_string().contains("redis"), "got: {err}");
    }

    #[test]
    fn undeclared_network_fails() {
        let doc = document(vec![ServiceDefinition::new("php", "php").network("backend")]);
        let err = validate(&doc).unwrap_err();
        assert!(err.to_string().contains("backend"), "got: {err}");
    }

    #[test]
    fn undeclared_volume_fails() {
        let doc = document(vec![
            ServiceDefinition::new("db", "mysql").mount(Mount::new("db-data", "/var/lib/mysql")),
        ]);
        assert!(validate(&doc).is_err());
    }

    #[test]
    fn cyclic_dependencies_fail() {
        let doc = document(vec![
            ServiceDefinition::new("a", "img").depends_on("b", DependencyCondition::ServiceStarted),
            ServiceDefinition::new("b", "img").depends_on("a", DependencyCondition::ServiceStarted),
        ]);
        assert!(validate(&doc).unwrap_err().to_string().contains("cyclic"));
    }
}
