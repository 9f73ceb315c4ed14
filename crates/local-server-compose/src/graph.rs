//! Service dependency graph built with `petgraph`.
//!
//! Nodes are service names, edges run from a dependency to its dependent, so
//! a topological sort yields the order services can be started in.

use std::collections::BTreeMap;

use local_server_common::error::{LocalServerError, Result};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::EnvironmentDocument;

/// Dependency graph of the services in one document.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: BTreeMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of every service and `depends_on` edge in `document`.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServerError::Validation`] if a dependency names a
    /// service that is not in the document.
    pub fn from_document(document: &EnvironmentDocument) -> Result<Self> {
        let mut graph = Self::new();
        for name in document.services.keys() {
            let _ = graph.add_service(name);
        }
        for (name, service) in &document.services {
            for dependency in service.depends_on.keys() {
                graph.add_dependency(name, dependency)?;
            }
        }
        Ok(graph)
    }

    /// Adds a service node, returning the existing node for a known name.
    pub fn add_service(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.nodes.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        let _ = self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Records that `dependent` waits on `dependency`.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServerError::Validation`] if either service is unknown.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        let to = self.node(dependent)?;
        let from = self.nodes.get(dependency).copied().ok_or_else(|| {
            LocalServerError::validation(format!(
                "service \"{dependent}\" depends on undefined service \"{dependency}\""
            ))
        })?;
        let _ = self.graph.add_edge(from, to, ());
        Ok(())
    }

    fn node(&self, name: &str) -> Result<NodeIndex> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| LocalServerError::validation(format!("unknown service \"{name}\"")))
    }

    /// Number of services in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no services.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Services in an order where every dependency precedes its dependents.
    ///
    /// The order is stable for a given document.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServerError::Validation`] naming a service on the cycle
    /// if the dependencies are cyclic.
    pub fn startup_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let name = self
                    .graph
                    .node_weight(cycle.node_id())
                    .cloned()
                    .unwrap_or_default();
                Err(LocalServerError::validation(format!(
                    "cyclic dependency detected involving service \"{name}\""
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use local_server_common::types::DependencyCondition;

    use super::*;
    use crate::model::ServiceDefinition;

    fn document(services: Vec<ServiceDefinition>) -> EnvironmentDocument {
        EnvironmentDocument {
            services: services.into_iter().map(|s| (s.name.clone(), s)).collect(),
            ..EnvironmentDocument::default()
        }
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert!(graph.startup_order().expect("should resolve").is_empty());
    }

    #[test]
    fn dependencies_start_first() {
        let doc = document(vec![
            ServiceDefinition::new("nginx", "img").depends_on("php", DependencyCondition::ServiceStarted),
            ServiceDefinition::new("php", "img").depends_on("db", DependencyCondition::ServiceHealthy),
            ServiceDefinition::new("db", "img"),
        ]);
        let order = DependencyGraph::from_document(&doc)
            .expect("graph")
            .startup_order()
            .expect("order");
        assert_eq!(order, vec!["db", "php", "nginx"]);
    }

    #[test]
    fn diamond_dependency() {
        let mut graph = DependencyGraph::new();
        for name in ["a", "b", "c", "d"] {
            let _ = graph.add_service(name);
        }
        graph.add_dependency("a", "b").expect("edge");
        graph.add_dependency("a", "c").expect("edge");
        graph.add_dependency("b", "d").expect("edge");
        graph.add_dependency("c", "d").expect("edge");

        let order = graph.startup_order().expect("should resolve");
        assert_eq!(order.len(), 4);
        let pos = |name: &str| order.iter().position(|n| n == name).expect(name);
        assert!(pos("d") < pos("b"));
        assert!(pos("d") < pos("c"));
        assert!(pos("b") < pos("a"));
        assert!(pos("c") < pos("a"));
    }

    #[test]
    fn cycle_detection() {
        let doc = document(vec![
            ServiceDefinition::new("a", "img").depends_on("b", DependencyCondition::ServiceStarted),
            ServiceDefinition::new("b", "img").depends_on("a", DependencyCondition::ServiceStarted),
        ]);
        let err = DependencyGraph::from_document(&doc)
            .expect("graph")
            .startup_order()
            .unwrap_err();
        assert!(err.to_string().contains("cyclic"), "got: {err}");
    }

    #[test]
    fn dangling_dependency_is_rejected() {
        let doc = document(vec![
            ServiceDefinition::new("php", "img").depends_on("db", DependencyCondition::ServiceHealthy),
        ]);
        let err = DependencyGraph::from_document(&doc).unwrap_err();
        assert!(matches!(err, LocalServerError::Validation { .. }));
        assert!(err.to_string().contains("\"db\""), "got: {err}");
    }

    #[test]
    fn repeated_service_reuses_node() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_service("a");
        assert_eq!(graph.add_service("a"), a);
        assert_eq!(graph.len(), 1);
    }
}
