//! Service definition builders.
//!
//! Each builder is a pure function of the resolved [`ProjectConfig`]. A
//! builder never looks at another builder's output: services refer to each
//! other by name only, so the builders can run in any order.

pub mod analytics;
pub mod db;
pub mod mailhog;
pub mod nginx;
pub mod nodejs;
pub mod redis;
pub mod runtime;
pub mod s3;
pub mod search;
pub mod tachyon;
pub mod webgrind;
pub mod xray;

use local_server_common::constants::{APP_MOUNT_TARGET, SYNC_VOLUME};
use local_server_common::error::Result;

use crate::model::{Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;

/// Signature shared by every builder.
pub type BuildFn = fn(&ProjectConfig) -> Result<Vec<ServiceDefinition>>;

/// A registered builder and the feature gate that decides whether it runs.
#[derive(Debug, Clone, Copy)]
pub struct Builder {
    /// Logical service name, for diagnostics.
    pub name: &'static str,
    /// Whether the builder runs for this configuration.
    pub enabled: fn(&ProjectConfig) -> bool,
    /// The builder itself.
    pub build: BuildFn,
}

const fn always(_: &ProjectConfig) -> bool {
    true
}

/// Every core builder.
pub const BUILDERS: &[Builder] = &[
    Builder {
        name: "db",
        enabled: always,
        build: db::build,
    },
    Builder {
        name: "redis",
        enabled: always,
        build: redis::build,
    },
    Builder {
        name: "php",
        enabled: always,
        build: runtime::build_php,
    },
    Builder {
        name: "nginx",
        enabled: always,
        build: nginx::build,
    },
    Builder {
        name: "mailhog",
        enabled: always,
        build: mailhog::build,
    },
    Builder {
        name: "cavalcade",
        enabled: |c| c.features.cavalcade,
        build: runtime::build_cavalcade,
    },
    Builder {
        name: "s3",
        enabled: |c| c.features.s3,
        build: s3::build,
    },
    Builder {
        name: "tachyon",
        enabled: |c| c.features.tachyon,
        build: tachyon::build,
    },
    Builder {
        name: "xray",
        enabled: |c| c.features.xray,
        build: xray::build,
    },
    Builder {
        name: "elasticsearch",
        enabled: |c| c.features.elasticsearch.is_some(),
        build: search::build_elasticsearch,
    },
    Builder {
        name: "kibana",
        enabled: |c| c.features.kibana,
        build: search::build_kibana,
    },
    Builder {
        name: "analytics",
        enabled: |c| c.features.analytics,
        build: analytics::build,
    },
    Builder {
        name: "nodejs",
        enabled: |c| c.nodejs.is_some(),
        build: nodejs::build,
    },
    Builder {
        name: "webgrind",
        enabled: |c| c.args.xdebug.includes_profiling(),
        build: webgrind::build,
    },
];

/// Builders whose feature gate is open for `config`.
pub fn enabled_builders(config: &ProjectConfig) -> Vec<&'static Builder> {
    BUILDERS.iter().filter(|b| (b.enabled)(config)).collect()
}

/// Runs `builders` in the given order and concatenates their output.
///
/// # Errors
///
/// Returns the first builder error.
pub fn run_builders(
    config: &ProjectConfig,
    builders: &[&Builder],
) -> Result<Vec<ServiceDefinition>> {
    let mut services = Vec::new();
    for builder in builders {
        tracing::debug!(builder = builder.name, "building service");
        services.extend((builder.build)(config)?);
    }
    Ok(services)
}

/// Runs every enabled builder.
///
/// # Errors
///
/// Returns the first builder error.
pub fn build_all(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    run_builders(config, &enabled_builders(config))
}

/// The application code mount, honouring the file sharing mode.
pub fn app_mount(config: &ProjectConfig) -> Mount {
    if config.args.mutagen {
        Mount::with_mode(SYNC_VOLUME, APP_MOUNT_TARGET, "delegated")
    } else {
        Mount::with_mode(config.root_str(), APP_MOUNT_TARGET, "delegated")
    }
}

/// Fills in `limit` on every service without an explicit memory limit.
pub fn apply_memory_defaults<'a>(
    services: impl IntoIterator<Item = &'a mut ServiceDefinition>,
    limit: &str,
) {
    for service in services {
        if service.mem_limit.is_none() {
            service.mem_limit = Some(limit.to_string());
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use local_server_common::config::EnvironmentOverrides;
    use local_server_common::types::GeneratorArgs;

    use crate::resolver::{self, ProjectConfig};
    use crate::settings::{ProjectSettings, RawSettings};

    pub fn config_with(raw: RawSettings, args: GeneratorArgs) -> ProjectConfig {
        let settings = ProjectSettings {
            local_server: RawSettings {
                name: raw.name.clone().or_else(|| Some("acme".into())),
                tld: raw.tld.clone().or_else(|| Some("test.dev".into())),
                ..raw
            },
            ..ProjectSettings::default()
        };
        resolver::resolve(
            &settings,
            Path::new("/srv/acme"),
            args,
            EnvironmentOverrides::default(),
        )
        .expect("test config should resolve")
    }

    pub fn config() -> ProjectConfig {
        config_with(RawSettings::default(), GeneratorArgs::default())
    }
}
