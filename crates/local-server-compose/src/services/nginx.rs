//! Web frontend.

use local_server_common::constants::{DEFAULT_NETWORK, PROXY_NETWORK, SITE_ROUTER_PRIORITY};
use local_server_common::error::Result;
use local_server_common::types::DependencyCondition;

use crate::model::{Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;
use crate::routing::{Protocol, Router, RoutingRule};

/// Web frontend image.
pub const IMAGE: &str = "humanmade/altis-local-server-nginx:3.4.0";

/// The catch-all rule for the site: the primary hostname, every extra
/// domain, and all of their subdomains.
pub fn site_rule(config: &ProjectConfig) -> RoutingRule {
    RoutingRule::site(&config.hostname, config.domains.iter().map(String::as_str))
}

/// Builds the `nginx` service.
///
/// Its router carries the lowest priority so that path-scoped routers on
/// the same hosts are matched first.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let read_timeout = if config.args.xdebug.is_enabled() {
        "9000s"
    } else {
        "60s"
    };
    let router = Router::new(site_rule(config), 8080)
        .protocol(Protocol::Https)
        .priority(SITE_ROUTER_PRIORITY);

    Ok(vec![
        ServiceDefinition::new("nginx", IMAGE)
            .container_name(config.container_name("nginx"))
            .depends_on("php", DependencyCondition::ServiceStarted)
            .mount(super::app_mount(config))
            .mount(Mount::new("socket", "/var/run/php-fpm"))
            .network(PROXY_NETWORK)
            .network(DEFAULT_NETWORK)
            .port(8080)
            .route(&router)
            .env("GZIP_STATUS", "on")
            .env("READ_TIMEOUT", read_timeout),
    ])
}
