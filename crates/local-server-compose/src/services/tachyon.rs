//! Tachyon image transform service.

use local_server_common::constants::{AUXILIARY_ROUTER_PRIORITY, PROXY_NETWORK, S3_REGION};
use local_server_common::error::Result;

use crate::model::ServiceDefinition;
use crate::resolver::ProjectConfig;
use crate::routing::{PathRewrite, Router, RoutingRule};

/// Image service image.
pub const IMAGE: &str = "humanmade/tachyon:v2.4.0";

/// `/tachyon/<file>` on any site host, rewritten to `/uploads/<file>`.
pub fn rule(config: &ProjectConfig) -> RoutingRule {
    super::nginx::site_rule(config)
        .path_prefix("/tachyon")
        .rewrite(PathRewrite::Replace {
            pattern: "^/tachyon/(.*)".into(),
            replacement: "/uploads/$$1".into(),
        })
}

/// Builds the `tachyon` service.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let s3_host = config.prefixed_host("s3");
    let router = Router::new(rule(config), 8080).priority(AUXILIARY_ROUTER_PRIORITY);
    Ok(vec![
        ServiceDefinition::new("tachyon", IMAGE)
            .container_name(config.container_name("tachyon"))
            .port(8080)
            .network(PROXY_NETWORK)
            .route(&router)
            .env("AWS_REGION", S3_REGION)
            .env("AWS_S3_BUCKET", config.bucket())
            .env("AWS_S3_ENDPOINT", format!("{}://{s3_host}/", config.scheme()))
            .external_link(format!("proxy:{s3_host}")),
    ])
}
