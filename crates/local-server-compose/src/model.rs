//! In-memory model of the generated compose document.
//!
//! Every collection that ends up in the rendered file is a `BTreeMap` or
//! `BTreeSet`, so two documents built from the same configuration serialize
//! to identical bytes regardless of the order services were registered in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use local_server_common::types::DependencyCondition;
use serde::{Serialize, Serializer};

use crate::routing::Router;

/// A `source:target[:mode]` mount.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mount {
    /// Host path or named volume.
    pub source: String,
    /// Path inside the container.
    pub target: String,
    /// Access or consistency mode (`rw`, `ro`, `delegated`, ...).
    pub mode: Option<String>,
}

impl Mount {
    /// Creates a mount without an explicit mode.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mode: None,
        }
    }

    /// Creates a mount with the given mode.
    pub fn with_mode(
        source: impl Into<String>,
        target: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mode: Some(mode.into()),
        }
    }

    /// Whether the source names a compose volume rather than a host path.
    pub fn is_named_volume(&self) -> bool {
        let s = self.source.as_str();
        !s.is_empty()
            && !s.starts_with('/')
            && !s.starts_with('.')
            && !s.starts_with('~')
            && !s.contains('/')
            && !s.contains('\\')
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.target)?;
        if let Some(mode) = &self.mode {
            write!(f, ":{mode}")?;
        }
        Ok(())
    }
}

impl Serialize for Mount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A `depends_on` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Readiness condition the dependent waits for.
    pub condition: DependencyCondition,
}

/// Container healthcheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Healthcheck {
    /// Probe command in exec form (`CMD`/`CMD-SHELL` first).
    pub test: Vec<String>,
    /// Interval between probes.
    pub interval: String,
    /// Probe timeout.
    pub timeout: String,
    /// Consecutive failures before the container is unhealthy.
    pub retries: u32,
}

/// A resource ulimit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ulimit {
    /// Soft limit (`-1` for unlimited).
    pub soft: i64,
    /// Hard limit (`-1` for unlimited).
    pub hard: i64,
}

/// One runnable unit of the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDefinition {
    /// Service key in the document.
    #[serde(skip)]
    pub name: String,
    /// Fully qualified image reference.
    pub image: String,
    /// Explicit container name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    /// Run an init process as PID 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<bool>,
    /// Entrypoint override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Command override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// User the process runs as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Restart policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    /// Working directory inside the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Condition-gated dependencies, keyed by service name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub depends_on: BTreeMap<String, Dependency>,
    /// Network aliases to other services (`service:alias`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    /// Aliases to containers outside this project.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_links: Vec<String>,
    /// Mounts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Mount>,
    /// Network memberships.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub networks: BTreeSet<String>,
    /// Exposed container ports.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Environment variables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Container labels, including the rendered routing rules.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Healthcheck.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,
    /// Ulimits.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ulimits: BTreeMap<String, Ulimit>,
    /// Memory limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,
}

impl ServiceDefinition {
    /// Creates a service with only a name and image.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            container_name: None,
            init: None,
            entrypoint: None,
            command: None,
            user: None,
            restart: None,
            working_dir: None,
            depends_on: BTreeMap::new(),
            links: Vec::new(),
            external_links: Vec::new(),
            volumes: Vec::new(),
            networks: BTreeSet::new(),
            ports: Vec::new(),
            environment: BTreeMap::new(),
            labels: BTreeMap::new(),
            healthcheck: None,
            ulimits: BTreeMap::new(),
            mem_limit: None,
        }
    }

    /// Sets the container name.
    #[must_use]
    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    /// Enables the init process.
    #[must_use]
    pub const fn init(mut self) -> Self {
        self.init = Some(true);
        self
    }

    /// Sets the entrypoint.
    #[must_use]
    pub fn entrypoint<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = Some(parts.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the command.
    #[must_use]
    pub fn command<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(parts.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the user.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the restart policy.
    #[must_use]
    pub fn restart(mut self, policy: impl Into<String>) -> Self {
        self.restart = Some(policy.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Adds a condition-gated dependency.
    #[must_use]
    pub fn depends_on(mut self, service: impl Into<String>, condition: DependencyCondition) -> Self {
        let _ = self
            .depends_on
            .insert(service.into(), Dependency { condition });
        self
    }

    /// Adds a link.
    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }

    /// Adds an external link.
    #[must_use]
    pub fn external_link(mut self, link: impl Into<String>) -> Self {
        self.external_links.push(link.into());
        self
    }

    /// Adds a mount.
    #[must_use]
    pub fn mount(mut self, mount: Mount) -> Self {
        self.volumes.push(mount);
        self
    }

    /// Joins a network.
    #[must_use]
    pub fn network(mut self, network: impl Into<String>) -> Self {
        let _ = self.networks.insert(network.into());
        self
    }

    /// Exposes a container port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.ports.push(port.to_string());
        self
    }

    /// Sets an environment variable, replacing any earlier value.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let _ = self.environment.insert(key.into(), value.to_string());
        self
    }

    /// Sets a label.
    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.labels.insert(key.into(), value.into());
        self
    }

    /// Renders a reverse-proxy router into labels.
    #[must_use]
    pub fn route(mut self, router: &Router) -> Self {
        self.labels.extend(router.labels());
        self
    }

    /// Sets the healthcheck.
    #[must_use]
    pub fn healthcheck(mut self, healthcheck: Healthcheck) -> Self {
        self.healthcheck = Some(healthcheck);
        self
    }

    /// Sets a ulimit.
    #[must_use]
    pub fn ulimit(mut self, name: impl Into<String>, soft: i64, hard: i64) -> Self {
        let _ = self.ulimits.insert(name.into(), Ulimit { soft, hard });
        self
    }

    /// Sets the memory limit.
    #[must_use]
    pub fn mem_limit(mut self, limit: impl Into<String>) -> Self {
        self.mem_limit = Some(limit.into());
        self
    }

    /// Names of every named volume this service mounts.
    pub fn named_volumes(&self) -> impl Iterator<Item = &str> {
        self.volumes
            .iter()
            .filter(|m| m.is_named_volume())
            .map(|m| m.source.as_str())
    }
}

/// A top-level network declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDefinition {
    /// Actual engine-level network name.
    pub name: String,
    /// Managed outside of this project.
    pub external: bool,
}

/// A top-level volume declaration with a custom driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeDefinition {
    /// Volume driver.
    pub driver: String,
    /// Driver options.
    pub driver_opts: BTreeMap<String, String>,
}

impl VolumeDefinition {
    /// A local volume bound to a host directory.
    pub fn host_bind(device: impl Into<String>) -> Self {
        let mut driver_opts = BTreeMap::new();
        let _ = driver_opts.insert("type".to_string(), "none".to_string());
        let _ = driver_opts.insert("device".to_string(), device.into());
        let _ = driver_opts.insert("o".to_string(), "bind".to_string());
        Self {
            driver: "local".into(),
            driver_opts,
        }
    }
}

/// Permission defaults applied on the synchronized side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPermissions {
    /// Owner of synchronized files.
    pub default_owner: String,
    /// Group of synchronized files.
    pub default_group: String,
    /// Mode for new files.
    pub default_file_mode: String,
    /// Mode for new directories.
    pub default_directory_mode: String,
}

/// Configuration for the volume side of a sync session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEndpointConfig {
    /// Permission defaults.
    pub permissions: SyncPermissions,
}

/// Paths excluded from synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncIgnore {
    /// Ignored paths, relative to the sync root.
    pub paths: Vec<String>,
}

/// One two-way sync session between the host and a named volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSession {
    /// Host side.
    pub alpha: String,
    /// Volume side (`volume://<name>`).
    pub beta: String,
    /// Volume side configuration.
    pub configuration_beta: SyncEndpointConfig,
    /// Conflict resolution mode.
    pub mode: String,
    /// Ignored paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<SyncIgnore>,
}

/// The `x-mutagen` extension block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncBlock {
    /// Sessions keyed by name.
    pub sync: BTreeMap<String, SyncSession>,
}

/// The assembled environment document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentDocument {
    /// Services keyed by name.
    pub services: BTreeMap<String, ServiceDefinition>,
    /// Networks; `None` renders as a bare, default-configured network.
    pub networks: BTreeMap<String, Option<NetworkDefinition>>,
    /// Named volumes; `None` renders as a plain named volume.
    pub volumes: BTreeMap<String, Option<VolumeDefinition>>,
    /// File synchronization block.
    #[serde(rename = "x-mutagen", skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncBlock>,
}

impl EnvironmentDocument {
    /// Looks up a service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.get(name)
    }

    /// Mutable lookup, for extension filters.
    pub fn service_mut(&mut self, name: &str) -> Option<&mut ServiceDefinition> {
        self.services.get_mut(name)
    }

    /// Sorted service names.
    pub fn service_names(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_renders_short_syntax() {
        assert_eq!(Mount::new("tmp", "/tmp").to_string(), "tmp:/tmp");
        assert_eq!(
            Mount::with_mode("/srv/app", "/usr/src/app", "delegated").to_string(),
            "/srv/app:/usr/src/app:delegated"
        );
    }

    #[test]
    fn named_volume_detection() {
        assert!(Mount::new("db-data", "/var/lib/mysql").is_named_volume());
        assert!(!Mount::new("/srv/app", "/usr/src/app").is_named_volume());
        assert!(!Mount::new("./php.ini", "/etc/php.ini").is_named_volume());
        assert!(!Mount::new("vendor/x.ini", "/etc/x.ini").is_named_volume());
    }

    #[test]
    fn env_replaces_existing_key() {
        let svc = ServiceDefinition::new("php", "img")
            .env("A", 1)
            .env("A", "two");
        assert_eq!(svc.environment.len(), 1);
        assert_eq!(svc.environment["A"], "two");
    }

    #[test]
    fn empty_collections_are_omitted() {
        let svc = ServiceDefinition::new("redis", "redis:alpine");
        let yaml = serde_yaml::to_string(&svc).expect("yaml");
        assert_eq!(yaml.trim(), "image: redis:alpine");
    }

    #[test]
    fn host_bind_volume_options() {
        let vol = VolumeDefinition::host_bind("/srv/app/.tmp");
        assert_eq!(vol.driver, "local");
        assert_eq!(vol.driver_opts["device"], "/srv/app/.tmp");
        assert_eq!(vol.driver_opts["o"], "bind");
    }
}
