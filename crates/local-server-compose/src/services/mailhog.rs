//! Mail capture service.

use local_server_common::constants::{AUXILIARY_ROUTER_PRIORITY, DEFAULT_NETWORK, PROXY_NETWORK};
use local_server_common::error::Result;

use crate::model::ServiceDefinition;
use crate::resolver::ProjectConfig;
use crate::routing::{Router, RoutingRule};

/// Mail capture image.
pub const IMAGE: &str = "cd2team/mailhog:latest";

/// Builds the `mailhog` service, served under `/mailhog` on the site host.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let rule = RoutingRule::host(&config.hostname).path_prefix("/mailhog");
    Ok(vec![
        ServiceDefinition::new("mailhog", IMAGE)
            .container_name(config.container_name("mailhog"))
            .port(8025)
            .port(1025)
            .network(PROXY_NETWORK)
            .network(DEFAULT_NETWORK)
            .route(&Router::new(rule, 8025).priority(AUXILIARY_ROUTER_PRIORITY))
            .env("MH_UI_WEB_PATH", "mailhog"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::config;

    #[test]
    fn mailhog_rule_is_path_scoped() {
        let svc = build(&config()).expect("mailhog").remove(0);
        assert_eq!(
            svc.labels["traefik.frontend.rule"],
            "Host:acme.test.dev;PathPrefix:/mailhog"
        );
    }
}
