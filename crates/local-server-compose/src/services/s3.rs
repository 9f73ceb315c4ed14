//! S3-compatible object storage, its bucket bootstrap job, and the
//! mirror that syncs uploads back to the host.

use local_server_common::constants::{
    AUXILIARY_ROUTER_PRIORITY, DEFAULT_NETWORK, PROXY_NETWORK, S3_ACCESS_KEY, S3_REGION,
    S3_SECRET_KEY,
};
use local_server_common::error::Result;
use local_server_common::types::DependencyCondition;

use crate::model::{Healthcheck, Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;
use crate::routing::{PathRewrite, Router, RoutingRule};

/// Object storage image.
pub const IMAGE: &str = "minio/minio:RELEASE.2021-09-18T18-09-59Z";

/// Object storage client image.
pub const CLIENT_IMAGE: &str = "minio/mc:RELEASE.2021-09-02T09-21-27Z";

/// Client alias definition pointing at the local storage.
fn client_host() -> String {
    format!("http://{S3_ACCESS_KEY}:{S3_SECRET_KEY}@s3:9000")
}

/// Router forwarding `/uploads` on the site hosts straight to the bucket.
fn uploads_router(config: &ProjectConfig) -> Router {
    let rule = super::nginx::site_rule(config)
        .path_prefix("/uploads")
        .rewrite(PathRewrite::AddPrefix(format!("/{}", config.bucket())));
    Router::segment("client", rule, 9000)
        .pass_host_header(false)
        .priority(AUXILIARY_ROUTER_PRIORITY)
}

/// Builds `s3`, `s3-create-bucket` and `s3-sync-to-host`.
///
/// # Errors
///
/// Never fails; the signature matches the other builders.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let bucket = config.bucket();
    let local_bucket = format!("local/{bucket}");

    let s3 = ServiceDefinition::new("s3", IMAGE)
        .container_name(config.container_name("s3"))
        .mount(Mount::with_mode("s3", "/data", "rw"))
        .port(9000)
        .port(9001)
        .network(PROXY_NETWORK)
        .network(DEFAULT_NETWORK)
        .env("MINIO_DOMAIN", format!("s3.localhost,{},s3", config.tld))
        .env("MINIO_REGION_NAME", S3_REGION)
        .env("MINIO_ROOT_USER", S3_ACCESS_KEY)
        .env("MINIO_ROOT_PASSWORD", S3_SECRET_KEY)
        .command(["server", "/data", "--console-address", ":9001"])
        .healthcheck(Healthcheck {
            test: ["CMD", "curl", "-f", "http://localhost:9000/minio/health/live"]
                .map(String::from)
                .to_vec(),
            interval: "5s".into(),
            timeout: "5s".into(),
            retries: 20,
        })
        .route(&Router::segment(
            "api",
            RoutingRule::host(config.prefixed_host("s3")),
            9000,
        ))
        .route(&Router::segment(
            "console",
            RoutingRule::host(config.prefixed_host("s3-console")),
            9001,
        ))
        .route(&uploads_router(config));

    let create_bucket = ServiceDefinition::new("s3-create-bucket", CLIENT_IMAGE)
        .container_name(config.container_name("s3-create-bucket"))
        .depends_on("s3", DependencyCondition::ServiceHealthy)
        .env("MC_HOST_local", client_host())
        .entrypoint([
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!("mc mb -p {local_bucket} && mc policy set public {local_bucket}"),
        ]);

    let sync_to_host = ServiceDefinition::new("s3-sync-to-host", CLIENT_IMAGE)
        .container_name(config.container_name("s3-sync"))
        .restart("unless-stopped")
        .depends_on(
            "s3-create-bucket",
            DependencyCondition::ServiceCompletedSuccessfully,
        )
        .env("MC_HOST_local", client_host())
        .mount(Mount::with_mode(
            format!("{}/content/uploads", config.root_str()),
            "/content/uploads",
            "delegated",
        ))
        .entrypoint([
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!("mc mirror --watch --overwrite -a {local_bucket} /content"),
        ]);

    Ok(vec![s3, create_bucket, sync_to_host])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::label_priority;
    use crate::services::test_support::config;

    #[test]
    fn builds_storage_bootstrap_and_mirror() {
        let services = build(&config()).expect("s3");
        let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["s3", "s3-create-bucket", "s3-sync-to-host"]);
        assert_eq!(
            services[2].depends_on["s3-create-bucket"].condition,
            DependencyCondition::ServiceCompletedSuccessfully
        );
        assert_eq!(
            services[1].depends_on["s3"].condition,
            DependencyCondition::ServiceHealthy
        );
    }

    #[test]
    fn uploads_are_rewritten_into_the_bucket() {
        let cfg = config();
        let s3 = build(&cfg).expect("s3").remove(0);
        let rule = &s3.labels["traefik.client.frontend.rule"];
        assert!(rule.contains(";PathPrefix:/uploads;AddPrefix:/s3-acme"), "got: {rule}");
        assert_eq!(s3.labels["traefik.client.frontend.passHostHeader"], "false");
        assert_eq!(
            label_priority(&s3.labels, Some("client")),
            Some(AUXILIARY_ROUTER_PRIORITY)
        );
        assert!(uploads_router(&cfg).rule().matches("acme.test.dev", "/uploads/a.jpg"));
        assert!(!uploads_router(&cfg).rule().matches("acme.test.dev", "/wp-admin"));
    }

    #[test]
    fn api_and_console_hosts() {
        let s3 = build(&config()).expect("s3").remove(0);
        assert_eq!(s3.labels["traefik.api.frontend.rule"], "Host:s3-acme.test.dev");
        assert_eq!(
            s3.labels["traefik.console.frontend.rule"],
            "Host:s3-console-acme.test.dev"
        );
    }
}
