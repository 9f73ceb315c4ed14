//! # local-server-compose
//!
//! Generator for the Local Server docker-compose environment.
//!
//! Handles:
//! - **Settings**: Typed view of the `composer.json` module blocks.
//! - **Resolver**: Defaults, feature interaction and version checks.
//! - **Catalog**: Supported versions and their images.
//! - **Services**: One pure builder per service family.
//! - **Routing**: Reverse-proxy rules rendered into container labels.
//! - **Assembler**: Networks, volumes, file sync and extension hooks.
//! - **Validator**: Referential integrity and dependency cycles.
//! - **Serializer**: Deterministic YAML output.

pub mod assembler;
pub mod catalog;
pub mod extension;
pub mod generator;
pub mod graph;
pub mod model;
pub mod resolver;
pub mod routing;
pub mod serializer;
pub mod services;
pub mod settings;
pub mod validator;

pub use assembler::Assembler;
pub use extension::{ComposeExtension, ExtensionRegistry};
pub use generator::Generator;
pub use model::EnvironmentDocument;
pub use resolver::ProjectConfig;
