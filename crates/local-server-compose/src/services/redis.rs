//! Redis object cache.

use local_server_common::error::Result;

use crate::model::ServiceDefinition;
use crate::resolver::ProjectConfig;

/// Cache image.
pub const IMAGE: &str = "redis:7.2-alpine";

/// Builds the `redis` service.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    Ok(vec![
        ServiceDefinition::new("redis", IMAGE)
            .container_name(config.container_name("redis"))
            .port(6379),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::config;

    #[test]
    fn cache_exposes_default_port() {
        let redis = build(&config()).expect("redis").remove(0);
        assert_eq!(redis.image, IMAGE);
        assert_eq!(redis.container_name.as_deref(), Some("acme-redis"));
        assert_eq!(redis.ports, vec!["6379"]);
    }
}
