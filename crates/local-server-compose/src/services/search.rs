//! Search service and its dashboard.

use local_server_common::constants::{AUXILIARY_ROUTER_PRIORITY, DEFAULT_NETWORK, PROXY_NETWORK};
use local_server_common::error::{LocalServerError, Result};
use local_server_common::types::DependencyCondition;

use crate::catalog::{self, Component};
use crate::model::{Healthcheck, Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;
use crate::routing::{Router, RoutingRule};

fn search_version(config: &ProjectConfig) -> Result<&str> {
    config
        .features
        .elasticsearch
        .as_deref()
        .ok_or_else(|| LocalServerError::config("search service requested while search is off"))
}

/// Builds the `elasticsearch` service.
///
/// # Errors
///
/// Returns an error if search is off or its version is not in the catalog.
pub fn build_elasticsearch(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let version = search_version(config)?;
    let image = catalog::resolve(Component::Elasticsearch, version)?;
    let heap = &config.overrides.es_mem_limit;

    Ok(vec![
        ServiceDefinition::new("elasticsearch", image)
            .container_name(config.container_name("es"))
            .restart("unless-stopped")
            .ulimit("memlock", -1, -1)
            .mem_limit(heap.clone())
            .mount(Mount::new("es-data", "/usr/share/elasticsearch/data"))
            .mount(Mount::new(
                format!("{}/content/uploads/es-packages", config.root_str()),
                "/usr/share/elasticsearch/config/packages",
            ))
            .port(9200)
            .network(PROXY_NETWORK)
            .network(DEFAULT_NETWORK)
            .healthcheck(Healthcheck {
                test: vec![
                    "CMD-SHELL".into(),
                    "curl --silent --fail localhost:9200/_cluster/health || exit 1".into(),
                ],
                interval: "5s".into(),
                timeout: "5s".into(),
                retries: 25,
            })
            .route(&Router::new(
                RoutingRule::host(config.prefixed_host("elasticsearch")),
                9200,
            ))
            .env("http.max_content_length", "10mb")
            .env("http.cors.enabled", "true")
            .env("http.cors.allow-origin", "*")
            .env("http.cors.allow-headers", "X-Requested-With,X-Auth-Token,Content-Type,Content-Length,Authorization")
            .env("http.cors.allow-credentials", "true")
            .env("discovery.type", "single-node")
            .env("xpack.security.enabled", "false")
            .env("ES_JAVA_OPTS", format!("-Xms512m -Xmx{heap}")),
    ])
}

/// Builds the `kibana` dashboard.
///
/// # Errors
///
/// Returns an error if search is off or its version has no dashboard image.
pub fn build_kibana(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let version = search_version(config)?;
    let image = catalog::resolve(Component::Kibana, version)?;
    let config_file = if catalog::major_at_least(version, 7) {
        "kibana-7.yml"
    } else {
        "kibana.yml"
    };
    let rule = RoutingRule::host(config.hostname.clone()).path_prefix("/kibana");

    Ok(vec![
        ServiceDefinition::new("kibana", image)
            .container_name(config.container_name("kibana"))
            .depends_on("elasticsearch", DependencyCondition::ServiceHealthy)
            .mount(Mount::new(
                config.config_file(config_file),
                "/usr/share/kibana/config/kibana.yml",
            ))
            .port(5601)
            .network(PROXY_NETWORK)
            .network(DEFAULT_NETWORK)
            .external_link(format!("proxy:{}", config.prefixed_host("elasticsearch")))
            .route(&Router::new(rule, 5601).priority(AUXILIARY_ROUTER_PRIORITY)),
    ])
}

#[cfg(test)]
mod tests {
    use local_server_common::types::GeneratorArgs;

    use super::*;
    use crate::services::test_support::{config, config_with};
    use crate::settings::{RawSettings, Selector};

    fn with_search(version: &str) -> ProjectConfig {
        config_with(
            RawSettings {
                elasticsearch: Some(Selector::Text(version.into())),
                kibana: Some(true),
                ..RawSettings::default()
            },
            GeneratorArgs::default(),
        )
    }

    #[test]
    fn elasticsearch_uses_heap_override() {
        let mut cfg = with_search("7");
        cfg.overrides.es_mem_limit = "2g".into();
        let es = build_elasticsearch(&cfg).expect("es").remove(0);
        assert_eq!(es.mem_limit.as_deref(), Some("2g"));
        assert_eq!(es.environment["ES_JAVA_OPTS"], "-Xms512m -Xmx2g");
        assert_eq!(es.ulimits["memlock"].soft, -1);
        assert_eq!(es.restart.as_deref(), Some("unless-stopped"));
        assert_eq!(es.labels["traefik.frontend.rule"], "Host:elasticsearch-acme.test.dev");
    }

    #[test]
    fn kibana_config_follows_major_version() {
        let seven = build_kibana(&with_search("7.10")).expect("kibana").remove(0);
        assert!(seven.volumes[0].source.ends_with("kibana-7.yml"));
        let six = build_kibana(&with_search("6.8")).expect("kibana").remove(0);
        assert!(six.volumes[0].source.ends_with("/kibana.yml"));
        assert_eq!(six.image, "blacktop/kibana:6.8");
        assert_eq!(
            six.depends_on["elasticsearch"].condition,
            DependencyCondition::ServiceHealthy
        );
    }

    #[test]
    fn search_builders_refuse_without_search() {
        assert!(build_elasticsearch(&config()).is_err());
        assert!(build_kibana(&config()).is_err());
    }
}
