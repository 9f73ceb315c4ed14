//! Node.js companion application.

use local_server_common::constants::{APP_MOUNT_TARGET, DEFAULT_NETWORK, PROXY_NETWORK};
use local_server_common::error::{LocalServerError, Result};

use crate::catalog::{self, Component};
use crate::model::ServiceDefinition;
use crate::resolver::ProjectConfig;
use crate::routing::{Router, RoutingRule};

/// Builds the `nodejs` service.
///
/// # Errors
///
/// Returns an error if the companion is not configured or its version is
/// not in the catalog.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let nodejs = config
        .nodejs
        .as_ref()
        .ok_or_else(|| LocalServerError::config("Node.js companion is not configured"))?;
    let image = catalog::resolve(Component::Nodejs, &nodejs.version)?;
    let path = nodejs.path.trim_matches('/');
    let working_dir = if path.is_empty() || path == "." {
        APP_MOUNT_TARGET.to_string()
    } else {
        format!("{APP_MOUNT_TARGET}/{path}")
    };
    let host = config.prefixed_host("node");

    Ok(vec![
        ServiceDefinition::new("nodejs", image)
            .container_name(config.container_name("nodejs"))
            .working_dir(working_dir)
            .command(["npm", "run", "dev"])
            .mount(super::app_mount(config))
            .port(3000)
            .network(PROXY_NETWORK)
            .network(DEFAULT_NETWORK)
            .route(&Router::new(RoutingRule::host(host.clone()), 3000))
            .env("NODE_ENV", "development")
            .env("PORT", 3000)
            .env("HOST", "0.0.0.0")
            .env("ALTIS_NODE_URL", format!("{}://{host}", config.scheme())),
    ])
}
