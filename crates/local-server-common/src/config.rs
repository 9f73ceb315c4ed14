//! Process environment overrides.
//!
//! [`EnvironmentOverrides`] is read exactly once, at the start of a run, and
//! threaded into the configuration resolver. Nothing downstream of the
//! resolver inspects the process environment.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ES_MEM_LIMIT, DEFAULT_MEM_LIMIT, ES_MEM_LIMIT_ENV, MEM_LIMIT_ENV};

/// Xdebug client host used by Docker Desktop.
pub const DOCKER_DESKTOP_HOST: &str = "host.docker.internal";

/// Xdebug client host for native Linux Docker (the `docker0` bridge).
pub const LINUX_BRIDGE_HOST: &str = "172.17.0.1";

/// Values taken from the process environment that influence generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentOverrides {
    /// Memory limit for services without an explicit one.
    pub mem_limit: String,
    /// Memory limit (and JVM heap ceiling) for the search service.
    pub es_mem_limit: String,
    /// CI marker forwarded into the runtime containers.
    pub ci: Option<String>,
    /// Host the PHP debugger connects back to.
    pub xdebug_client_host: String,
}

impl Default for EnvironmentOverrides {
    fn default() -> Self {
        Self {
            mem_limit: DEFAULT_MEM_LIMIT.into(),
            es_mem_limit: DEFAULT_ES_MEM_LIMIT.into(),
            ci: None,
            xdebug_client_host: DOCKER_DESKTOP_HOST.into(),
        }
    }
}

impl EnvironmentOverrides {
    /// Reads the overrides from the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the overrides from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let native_linux = cfg!(target_os = "linux") && lookup("WSL_INTEROP").is_none();
        let xdebug_client_host = if native_linux {
            LINUX_BRIDGE_HOST
        } else {
            DOCKER_DESKTOP_HOST
        };

        let overrides = Self {
            mem_limit: non_empty(MEM_LIMIT_ENV).unwrap_or_else(|| DEFAULT_MEM_LIMIT.into()),
            es_mem_limit: non_empty(ES_MEM_LIMIT_ENV)
                .unwrap_or_else(|| DEFAULT_ES_MEM_LIMIT.into()),
            ci: non_empty("CI"),
            xdebug_client_host: xdebug_client_host.into(),
        };
        tracing::debug!(
            mem_limit = %overrides.mem_limit,
            es_mem_limit = %overrides.es_mem_limit,
            ci = overrides.ci.is_some(),
            "read environment overrides"
        );
        overrides
    }
}
