//! Topology assembly.
//!
//! The [`Assembler`] collects service definitions from the core builders and
//! from extensions, then materializes them into an [`EnvironmentDocument`]
//! with the shared networks, the derived volume set, and the optional file
//! synchronization block.

use std::collections::BTreeMap;

use local_server_common::constants::{DEFAULT_NETWORK, PROXY_NETWORK, SYNC_VOLUME};
use local_server_common::error::{LocalServerError, Result};

use crate::extension::LoadedExtension;
use crate::model::{
    EnvironmentDocument, NetworkDefinition, ServiceDefinition, SyncBlock, SyncEndpointConfig,
    SyncIgnore, SyncPermissions, SyncSession, VolumeDefinition,
};
use crate::resolver::ProjectConfig;
use crate::services::{self, Builder};
use crate::validator;

/// Owner and group of files on the synchronized volume (`www-data` in the
/// runtime images).
const SYNC_OWNER: &str = "id:82";

/// Collects services for one generation pass.
#[derive(Debug)]
pub struct Assembler {
    config: ProjectConfig,
    services: BTreeMap<String, ServiceDefinition>,
    volumes: BTreeMap<String, Option<VolumeDefinition>>,
}

impl Assembler {
    /// Creates an empty assembler for `config`.
    #[must_use]
    pub const fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            services: BTreeMap::new(),
            volumes: BTreeMap::new(),
        }
    }

    /// The configuration this pass was resolved from.
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServerError::Config`] if a service with the same name
    /// is already registered.
    pub fn add_service(&mut self, service: ServiceDefinition) -> Result<()> {
        if self.services.contains_key(&service.name) {
            return Err(LocalServerError::config(format!(
                "service \"{}\" is registered more than once",
                service.name
            )));
        }
        tracing::debug!(service = %service.name, image = %service.image, "registered service");
        let _ = self.services.insert(service.name.clone(), service);
        Ok(())
    }

    /// Registers every service in `services`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_service`].
    pub fn add_services(&mut self, services: impl IntoIterator<Item = ServiceDefinition>) -> Result<()> {
        for service in services {
            self.add_service(service)?;
        }
        Ok(())
    }

    /// Declares a volume explicitly; `None` declares a plain named volume.
    ///
    /// Explicit declarations take precedence over volumes derived from
    /// mounts.
    pub fn add_volume(&mut self, name: impl Into<String>, definition: Option<VolumeDefinition>) {
        let _ = self.volumes.insert(name.into(), definition);
    }

    /// Whether a service named `name` is registered.
    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Runs `builders` against the configuration and registers their output.
    ///
    /// # Errors
    ///
    /// Returns the first builder error or duplicate registration.
    pub fn add_builders(&mut self, builders: &[&Builder]) -> Result<()> {
        let services = services::run_builders(&self.config, builders)?;
        self.add_services(services)
    }

    /// Runs every core builder whose feature gate is open.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_builders`].
    pub fn add_core_services(&mut self) -> Result<()> {
        let builders = services::enabled_builders(&self.config);
        self.add_builders(&builders)
    }

    /// Materializes the registered services into a document.
    ///
    /// Applies memory defaults, declares the shared networks and every
    /// referenced named volume, and adds the sync block when synchronized
    /// file sharing is on. The document is not validated.
    #[must_use]
    pub fn assemble(self) -> EnvironmentDocument {
        let Self {
            config,
            mut services,
            volumes: explicit,
        } = self;

        services::apply_memory_defaults(services.values_mut(), &config.overrides.mem_limit);

        let mut networks = BTreeMap::new();
        let _ = networks.insert(DEFAULT_NETWORK.to_string(), None);
        let _ = networks.insert(
            PROXY_NETWORK.to_string(),
            Some(NetworkDefinition {
                name: PROXY_NETWORK.to_string(),
                external: true,
            }),
        );

        let mut volumes: BTreeMap<String, Option<VolumeDefinition>> = services
            .values()
            .flat_map(ServiceDefinition::named_volumes)
            .map(|name| (name.to_string(), None))
            .collect();

        if config.args.tmp {
            let dir = config.root.join(".tmp");
            if let Err(e) = std::fs::create_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), error = %e, "cannot create tmp directory");
            }
            let _ = volumes.insert(
                "tmp".to_string(),
                Some(VolumeDefinition::host_bind(dir.display().to_string())),
            );
        }

        let sync = config.args.mutagen.then(|| {
            let _ = volumes.insert(SYNC_VOLUME.to_string(), None);
            sync_block(&config)
        });

        volumes.extend(explicit);

        tracing::info!(
            services = services.len(),
            volumes = volumes.len(),
            sync = sync.is_some(),
            "assembled environment document"
        );
        EnvironmentDocument {
            services,
            networks,
            volumes,
            sync,
        }
    }

    /// Runs the full extension protocol and returns a validated document.
    ///
    /// Every extension's `configure` runs in order, the document is
    /// materialized, every `filter` folds over it in the same order, memory
    /// defaults are applied to services the filters added, and the result is
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns the first extension failure or validation error.
    pub fn finish(mut self, extensions: &mut [LoadedExtension]) -> Result<EnvironmentDocument> {
        let args = self.config.args.clone();
        let mem_limit = self.config.overrides.mem_limit.clone();
        for extension in extensions.iter_mut() {
            extension.configure(&mut self, &args)?;
        }
        let mut document = self.assemble();
        for extension in extensions.iter() {
            document = extension.filter(document)?;
        }
        services::apply_memory_defaults(document.services.values_mut(), &mem_limit);
        validator::validate(&document)?;
        Ok(document)
    }
}

fn sync_block(config: &ProjectConfig) -> SyncBlock {
    let ignore = (!config.ignore_paths.is_empty()).then(|| SyncIgnore {
        paths: config.ignore_paths.clone(),
    });
    let session = SyncSession {
        alpha: config.root_str(),
        beta: format!("volume://{SYNC_VOLUME}"),
        configuration_beta: SyncEndpointConfig {
            permissions: SyncPermissions {
                default_owner: SYNC_OWNER.into(),
                default_group: SYNC_OWNER.into(),
                default_file_mode: "0664".into(),
                default_directory_mode: "0775".into(),
            },
        },
        mode: "two-way-resolved".into(),
        ignore,
    };
    let mut sync = BTreeMap::new();
    let _ = sync.insert(SYNC_VOLUME.to_string(), session);
    SyncBlock { sync }
}
