//! AWS X-Ray tracing daemon.

use local_server_common::constants::S3_REGION;
use local_server_common::error::Result;

use crate::model::ServiceDefinition;
use crate::resolver::ProjectConfig;

/// Tracing daemon image.
pub const IMAGE: &str = "amazon/aws-xray-daemon:3.3.3";

/// Builds the `xray` service.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    Ok(vec![
        ServiceDefinition::new("xray", IMAGE)
            .container_name(config.container_name("xray"))
            .port(2000)
            .env("AWS_ACCESS_KEY_ID", "YOUR_KEY_HERE")
            .env("AWS_SECRET_ACCESS_KEY", "YOUR_SECRET_HERE")
            .env("AWS_REGION", S3_REGION),
    ])
}
