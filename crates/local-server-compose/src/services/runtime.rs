//! PHP runtime family: the `php` application container and the `cavalcade`
//! job scheduler, which runs the same image with a different entrypoint.

use local_server_common::constants::{
    DB_CREDENTIAL, DEFAULT_NETWORK, PROXY_NETWORK, S3_ACCESS_KEY, S3_REGION, S3_SECRET_KEY,
};
use local_server_common::error::Result;
use local_server_common::types::DependencyCondition;

use crate::catalog::{self, Component};
use crate::model::{Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;

/// Dependencies every runtime-family container waits on.
pub fn dependencies(config: &ProjectConfig) -> Vec<(&'static str, DependencyCondition)> {
    let mut deps = vec![
        ("db", DependencyCondition::ServiceHealthy),
        ("redis", DependencyCondition::ServiceStarted),
        ("mailhog", DependencyCondition::ServiceStarted),
    ];
    if config.features.s3 {
        deps.push((
            "s3-create-bucket",
            DependencyCondition::ServiceCompletedSuccessfully,
        ));
    }
    if config.features.elasticsearch.is_some() {
        deps.push(("elasticsearch", DependencyCondition::ServiceHealthy));
    }
    deps
}

/// The configuration shared by `php` and `cavalcade`.
///
/// # Errors
///
/// Returns an error if the PHP version is not in the catalog.
pub fn base(config: &ProjectConfig, name: &str) -> Result<ServiceDefinition> {
    let image = catalog::resolve(Component::Php, &config.php_version)?;
    let hostname = &config.hostname;
    let features = &config.features;

    let mut service = ServiceDefinition::new(name, image)
        .container_name(config.container_name(name))
        .init()
        .link("db:db-read-replica")
        .external_link(format!("proxy:{hostname}"))
        .mount(super::app_mount(config))
        .mount(Mount::new(
            config.config_file("php.ini"),
            "/usr/local/etc/php/conf.d/altis.ini",
        ))
        .mount(Mount::new("socket", "/var/run/php-fpm"))
        .mount(Mount::new("tmp", "/tmp"))
        .network(PROXY_NETWORK)
        .network(DEFAULT_NETWORK)
        .env("HOST_PATH", config.root_str())
        .env("COMPOSE_PROJECT_NAME", hostname)
        .env("DB_HOST", "db")
        .env("DB_READ_REPLICA_HOST", "db-read-replica")
        .env("DB_PASSWORD", DB_CREDENTIAL)
        .env("DB_NAME", DB_CREDENTIAL)
        .env("DB_USER", DB_CREDENTIAL)
        .env("REDIS_HOST", "redis")
        .env("REDIS_PORT", 6379)
        .env("WP_DEBUG", 1)
        .env("WP_DEBUG_DISPLAY", 0)
        .env("PAGER", "more")
        .env("HM_ENV_ARCHITECTURE", "local-server")
        .env("HM_DEPLOYMENT_REVISION", "dev")
        .env("PHP_SENDMAIL_PATH", "/usr/sbin/sendmail -t -i -S mailhog:1025")
        .env(
            "XDEBUG_CONFIG",
            format!("client_host={}", config.overrides.xdebug_client_host),
        )
        .env("PHP_IDE_CONFIG", format!("serverName={hostname}"))
        .env("XDEBUG_SESSION", hostname)
        .env("XDEBUG_MODE", config.args.xdebug.as_str());

    for (dependency, condition) in dependencies(config) {
        service = service.depends_on(dependency, condition);
    }

    if config.args.xdebug.is_enabled() {
        service = service.mount(Mount::new(
            config.config_file("xdebug.ini"),
            "/usr/local/etc/php/conf.d/xdebug.ini",
        ));
    }

    let scheme = config.scheme();
    if features.s3 {
        let s3_host = config.prefixed_host("s3");
        service = service
            .link("s3:s3.localhost")
            .external_link(format!("proxy:{s3_host}"))
            .env("S3_UPLOADS_ENDPOINT", format!("{scheme}://{s3_host}/"))
            .env("S3_UPLOADS_BUCKET", config.bucket())
            .env("S3_UPLOADS_BUCKET_URL", format!("{scheme}://{s3_host}"))
            .env("S3_UPLOADS_KEY", S3_ACCESS_KEY)
            .env("S3_UPLOADS_SECRET", S3_SECRET_KEY)
            .env("S3_UPLOADS_REGION", S3_REGION)
            .env(
                "S3_CONSOLE_URL",
                format!("{scheme}://{}", config.prefixed_host("s3-console")),
            );
    }
    if features.tachyon {
        service = service.env("TACHYON_URL", format!("{scheme}://{hostname}/tachyon"));
    }
    if features.elasticsearch.is_some() {
        service = service
            .external_link(format!("proxy:{}", config.prefixed_host("elasticsearch")))
            .env("ELASTICSEARCH_HOST", "elasticsearch")
            .env("ELASTICSEARCH_PORT", 9200);
    }
    if features.analytics {
        let pinpoint = config.prefixed_host("pinpoint");
        let cognito = config.prefixed_host("cognito");
        service = service
            .external_link(format!("proxy:{pinpoint}"))
            .external_link(format!("proxy:{cognito}"))
            .env(
                "ALTIS_ANALYTICS_PINPOINT_ENDPOINT",
                format!("{scheme}://{pinpoint}"),
            )
            .env(
                "ALTIS_ANALYTICS_COGNITO_ENDPOINT",
                format!("{scheme}://{cognito}"),
            );
    }
    if features.xray {
        service = service.env("AWS_XRAY_DAEMON_HOST", "xray");
    }
    if let Some(ci) = &config.overrides.ci {
        service = service.env("CI", ci);
    }

    Ok(service)
}

/// Builds the `php` service.
///
/// # Errors
///
/// Returns an error if the PHP version is not in the catalog.
pub fn build_php(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    Ok(vec![base(config, "php")?])
}

/// Builds the `cavalcade` job scheduler.
///
/// # Errors
///
/// Returns an error if the PHP version is not in the catalog.
pub fn build_cavalcade(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let service = base(config, "cavalcade")?
        .entrypoint(["/usr/local/bin/cavalcade"])
        .user("nobody:nobody")
        .restart("unless-stopped");
    Ok(vec![service])
}
