//! Compose extensions: host-registered plugins that add services before the
//! document is materialized and rewrite the finished document afterwards.

use std::collections::BTreeMap;
use std::fmt;

use local_server_common::error::{LocalServerError, Result};
use local_server_common::types::GeneratorArgs;

use crate::assembler::Assembler;
use crate::model::EnvironmentDocument;

/// A plugin participating in document generation.
///
/// Both hooks are optional. `configure` runs for every declared extension
/// before any `filter` runs.
pub trait ComposeExtension {
    /// Registers extra services or volumes.
    ///
    /// # Errors
    ///
    /// Any error aborts generation.
    fn configure(&mut self, assembler: &mut Assembler, args: &GeneratorArgs) -> Result<()> {
        let _ = (assembler, args);
        Ok(())
    }

    /// Transforms the assembled document.
    ///
    /// # Errors
    ///
    /// Any error aborts generation.
    fn filter(&self, document: EnvironmentDocument) -> Result<EnvironmentDocument> {
        Ok(document)
    }
}

/// Creates a fresh extension instance.
pub type ExtensionFactory = Box<dyn Fn() -> Box<dyn ComposeExtension>>;

/// An instantiated extension together with the identifier it was declared as.
pub struct LoadedExtension {
    /// Declared `vendor/package` identifier.
    pub id: String,
    /// The extension.
    pub extension: Box<dyn ComposeExtension>,
}

impl fmt::Debug for LoadedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedExtension")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl LoadedExtension {
    /// Runs the configure hook, tagging failures with the extension id.
    ///
    /// # Errors
    ///
    /// Returns the hook's error; errors other than configuration errors are
    /// wrapped as [`LocalServerError::Extension`].
    pub fn configure(&mut self, assembler: &mut Assembler, args: &GeneratorArgs) -> Result<()> {
        tracing::debug!(extension = %self.id, "configuring extension");
        self.extension
            .configure(assembler, args)
            .map_err(|e| tag(&self.id, e))
    }

    /// Runs the filter hook, tagging failures with the extension id.
    ///
    /// # Errors
    ///
    /// Same as [`Self::configure`].
    pub fn filter(&self, document: EnvironmentDocument) -> Result<EnvironmentDocument> {
        tracing::debug!(extension = %self.id, "filtering document");
        self.extension.filter(document).map_err(|e| tag(&self.id, e))
    }
}

fn tag(id: &str, error: LocalServerError) -> LocalServerError {
    match error {
        e @ (LocalServerError::Extension { .. } | LocalServerError::Config { .. }) => e,
        other => LocalServerError::Extension {
            id: id.to_string(),
            message: other.to_string(),
        },
    }
}

/// Identifier to factory map populated by the host program.
#[derive(Default)]
pub struct ExtensionRegistry {
    factories: BTreeMap<String, ExtensionFactory>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `id`, replacing any earlier registration.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ComposeExtension> + 'static,
    {
        let _ = self.factories.insert(id.into(), Box::new(factory));
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiates the declared extensions in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServerError::Config`] naming the first declared
    /// identifier that has no registered factory.
    pub fn instantiate(&self, declared: &[String]) -> Result<Vec<LoadedExtension>> {
        declared
            .iter()
            .map(|id| {
                let factory = self.factories.get(id).ok_or_else(|| {
                    LocalServerError::config(format!("extension \"{id}\" is not registered"))
                })?;
                Ok(LoadedExtension {
                    id: id.clone(),
                    extension: factory(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl ComposeExtension for Noop {}

    struct Failing;

    impl ComposeExtension for Failing {
        fn filter(&self, _document: EnvironmentDocument) -> Result<EnvironmentDocument> {
            Err(LocalServerError::validation("broken"))
        }
    }

    #[test]
    fn instantiates_in_declaration_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register("acme/b", || Box::new(Noop));
        registry.register("acme/a", || Box::new(Noop));
        let loaded = registry
            .instantiate(&["acme/b".into(), "acme/a".into()])
            .expect("instantiate");
        let ids: Vec<_> = loaded.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["acme/b", "acme/a"]);
        assert_eq!(registry.ids(), vec!["acme/a", "acme/b"]);
    }

    #[test]
    fn unknown_identifier_is_a_configuration_error() {
        let registry = ExtensionRegistry::new();
        let err = registry.instantiate(&["acme/missing".into()]).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("acme/missing"));
    }

    #[test]
    fn default_filter_is_identity() {
        let loaded = LoadedExtension {
            id: "acme/noop".into(),
            extension: Box::new(Noop),
        };
        let doc = EnvironmentDocument::default();
        assert_eq!(loaded.filter(doc.clone()).expect("filter"), doc);
    }

    #[test]
    fn failures_are_tagged_with_the_extension_id() {
        let loaded = LoadedExtension {
            id: "acme/failing".into(),
            extension: Box::new(Failing),
        };
        let err = loaded.filter(EnvironmentDocument::default()).unwrap_err();
        match err {
            LocalServerError::Extension { id, message } => {
                assert_eq!(id, "acme/failing");
                assert!(message.contains("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
