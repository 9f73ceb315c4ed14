//! Local stand-ins for the analytics identity and event endpoints.

use local_server_common::constants::{DEFAULT_NETWORK, PROXY_NETWORK};
use local_server_common::error::Result;

use crate::model::ServiceDefinition;
use crate::resolver::ProjectConfig;
use crate::routing::{Router, RoutingRule};

/// Identity pool emulator.
pub const COGNITO_IMAGE: &str = "humanmade/local-cognito:1.1.0";

/// Event ingestion emulator.
pub const PINPOINT_IMAGE: &str = "humanmade/local-pinpoint:1.3.0";

fn companion(config: &ProjectConfig, name: &str, image: &str) -> ServiceDefinition {
    ServiceDefinition::new(name, image)
        .container_name(config.container_name(name))
        .restart("unless-stopped")
        .port(3000)
        .network(PROXY_NETWORK)
        .network(DEFAULT_NETWORK)
        .route(&Router::new(
            RoutingRule::host(config.prefixed_host(name)),
            3000,
        ))
}

/// Builds `cognito` and `pinpoint`.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let cognito = companion(config, "cognito", COGNITO_IMAGE)
        .env("AWS_ACCESS_KEY_ID", "admin")
        .env("AWS_SECRET_ACCESS_KEY", "password");
    let pinpoint = companion(config, "pinpoint", PINPOINT_IMAGE)
        .env("INDEX_ROTATION", "OneDay")
        .env("ELASTICSEARCH_HOST", "elasticsearch")
        .env("ELASTICSEARCH_PORT", 9200)
        .external_link(format!("proxy:{}", config.prefixed_host("elasticsearch")));
    Ok(vec![cognito, pinpoint])
}
