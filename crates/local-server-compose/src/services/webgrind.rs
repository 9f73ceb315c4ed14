//! Profiler output viewer, present when profiling is requested.

use local_server_common::constants::{AUXILIARY_ROUTER_PRIORITY, DEFAULT_NETWORK, PROXY_NETWORK};
use local_server_common::error::Result;
use local_server_common::types::DependencyCondition;

use crate::model::{Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;
use crate::routing::{PathRewrite, Router, RoutingRule};

/// Viewer image.
pub const IMAGE: &str = "wodby/webgrind:1.9";

/// Builds the `webgrind` service.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let rule = RoutingRule::host(config.hostname.clone())
        .path_prefix("/webgrind")
        .rewrite(PathRewrite::StripPrefix);
    Ok(vec![
        ServiceDefinition::new("webgrind", IMAGE)
            .container_name(config.container_name("webgrind"))
            .depends_on("php", DependencyCondition::ServiceStarted)
            .mount(Mount::new("tmp", "/tmp"))
            .port(8080)
            .network(PROXY_NETWORK)
            .network(DEFAULT_NETWORK)
            .route(&Router::new(rule, 8080).priority(AUXILIARY_ROUTER_PRIORITY))
            .env("WEBGRIND_PROFILER_DIR", "/tmp"),
    ])
}
