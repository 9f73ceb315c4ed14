//! MySQL database service.

use local_server_common::constants::DB_CREDENTIAL;
use local_server_common::error::Result;

use crate::catalog::{self, Component};
use crate::model::{Healthcheck, Mount, ServiceDefinition};
use crate::resolver::ProjectConfig;

/// Builds the `db` service.
///
/// # Errors
///
/// Returns an error if the MySQL version is not in the catalog.
pub fn build(config: &ProjectConfig) -> Result<Vec<ServiceDefinition>> {
    let image = catalog::resolve(Component::Mysql, &config.mysql_version)?;

    let mut service = ServiceDefinition::new("db", image)
        .container_name(config.container_name("db"))
        .mount(Mount::new("db-data", "/var/lib/mysql"))
        .port(3306)
        .env("MYSQL_ROOT_PASSWORD", DB_CREDENTIAL)
        .env("MYSQL_DATABASE", DB_CREDENTIAL)
        .env("MYSQL_USER", DB_CREDENTIAL)
        .env("MYSQL_PASSWORD", DB_CREDENTIAL)
        .healthcheck(Healthcheck {
            test: [
                "CMD",
                "mysqladmin",
                "ping",
                "-h",
                "localhost",
                "-u",
                DB_CREDENTIAL,
                "-pwordpress",
            ]
            .map(String::from)
            .to_vec(),
            interval: "5s".into(),
            timeout: "5s".into(),
            retries: 10,
        });

    // The PHP images' MySQL client only speaks mysql_native_password.
    if catalog::major_at_least(&config.mysql_version, 8) {
        service = service.command(["--default-authentication-plugin=mysql_native_password"]);
    }

    Ok(vec![service])
}

#[cfg(test)]
mod tests {
    use local_server_common::types::GeneratorArgs;

    use super::*;
    use crate::services::test_support::{config, config_with};
    use crate::settings::{RawSettings, Selector};

    #[test]
    fn default_mysql_is_eight() {
        let db = build(&config()).expect("db").remove(0);
        assert_eq!(db.image, "mysql:8.0");
        assert!(db.command.is_some());
        assert!(db.healthcheck.is_some());
        assert_eq!(db.named_volumes().collect::<Vec<_>>(), vec!["db-data"]);
    }

    #[test]
    fn mysql_five_seven_has_no_auth_override() {
        let cfg = config_with(
            RawSettings {
                mysql: Some(Selector::Text("5.7".into())),
                ..RawSettings::default()
            },
            GeneratorArgs::default(),
        );
        let db = build(&cfg).expect("db").remove(0);
        assert_eq!(db.image, "biarms/mysql:5.7");
        assert!(db.command.is_none());
    }
}
