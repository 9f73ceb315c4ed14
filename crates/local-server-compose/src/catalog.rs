//! Supported versions and the images they map to.
//!
//! Every versioned component resolves through this one table, so the set of
//! accepted selectors and the error listing them cannot drift apart.

use std::fmt;

use local_server_common::error::{LocalServerError, Result};

/// A component whose image depends on a version selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    /// PHP-FPM runtime shared by `php` and `cavalcade`.
    Php,
    /// MySQL database.
    Mysql,
    /// Elasticsearch search service.
    Elasticsearch,
    /// Kibana dashboard, versioned with Elasticsearch.
    Kibana,
    /// Node.js companion runtime.
    Nodejs,
}

impl Component {
    /// Every versioned component.
    pub const ALL: [Self; 5] = [
        Self::Php,
        Self::Mysql,
        Self::Elasticsearch,
        Self::Kibana,
        Self::Nodejs,
    ];

    /// Configuration key of the component.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Mysql => "mysql",
            Self::Elasticsearch => "elasticsearch",
            Self::Kibana => "kibana",
            Self::Nodejs => "nodejs",
        }
    }

    /// Version used when the configuration leaves the selector unset.
    pub const fn default_version(self) -> &'static str {
        match self {
            Self::Php => "8.2",
            Self::Mysql => "8.0",
            Self::Elasticsearch | Self::Kibana => "7",
            Self::Nodejs => "20",
        }
    }

    const fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Php => PHP_IMAGES,
            Self::Mysql => MYSQL_IMAGES,
            Self::Elasticsearch => ELASTICSEARCH_IMAGES,
            Self::Kibana => KIBANA_IMAGES,
            Self::Nodejs => NODEJS_IMAGES,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

const PHP_IMAGES: &[(&str, &str)] = &[
    ("8.3", "humanmade/altis-local-server-php:8.3.2"),
    ("8.2", "humanmade/altis-local-server-php:8.2.4"),
    ("8.1", "humanmade/altis-local-server-php:6.1.3"),
    ("8.0", "humanmade/altis-local-server-php:5.0.1"),
    ("7.4", "humanmade/altis-local-server-php:4.2.0"),
];

const MYSQL_IMAGES: &[(&str, &str)] = &[
    ("8.0", "mysql:8.0"),
    ("5.7", "biarms/mysql:5.7"),
];

const ELASTICSEARCH_IMAGES: &[(&str, &str)] = &[
    ("7.10", "humanmade/altis-local-server-elasticsearch:4.1.0"),
    ("7", "humanmade/altis-local-server-elasticsearch:4.1.0"),
    ("6.8", "humanmade/altis-local-server-elasticsearch:3.1.0"),
    ("6", "humanmade/altis-local-server-elasticsearch:3.1.0"),
    ("6.3", "humanmade/altis-local-server-elasticsearch:3.0.0"),
];

const KIBANA_IMAGES: &[(&str, &str)] = &[
    ("7.10", "humanmade/altis-local-server-kibana:1.1.1"),
    ("7", "humanmade/altis-local-server-kibana:1.1.1"),
    ("6.8", "blacktop/kibana:6.8"),
    ("6", "blacktop/kibana:6.8"),
    ("6.3", "blacktop/kibana:6.3"),
];

const NODEJS_IMAGES: &[(&str, &str)] = &[
    ("22", "node:22-bookworm-slim"),
    ("20", "node:20-bookworm-slim"),
    ("18", "node:18-bookworm-slim"),
    ("16", "node:16-bullseye-slim"),
];

/// Resolves `version` of `component` to its image reference.
///
/// # Errors
///
/// Returns [`LocalServerError::UnsupportedVersion`] listing every accepted
/// version when the selector is not in the table.
pub fn resolve(component: Component, version: &str) -> Result<&'static str> {
    component
        .table()
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, image)| *image)
        .ok_or_else(|| LocalServerError::UnsupportedVersion {
            component: component.key(),
            version: version.to_string(),
            supported: versions(component),
        })
}

/// Accepted version selectors for `component`, newest first.
pub fn versions(component: Component) -> Vec<String> {
    let mut versions: Vec<String> = component
        .table()
        .iter()
        .map(|(v, _)| (*v).to_string())
        .collect();
    versions.sort_by(|a, b| compare_versions(b, a));
    versions
}

/// Checks that `version` is accepted without resolving the image.
///
/// # Errors
///
/// Same as [`resolve`].
pub fn check(component: Component, version: &str) -> Result<()> {
    resolve(component, version).map(|_| ())
}

fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let parts = |s: &str| -> Vec<u32> { s.split('.').filter_map(|p| p.parse().ok()).collect() };
    parts(a).cmp(&parts(b))
}

/// Whether `version` is at least major version `major`.
pub fn major_at_least(version: &str, major: u32) -> bool {
    version
        .split('.')
        .next()
        .and_then(|m| m.parse::<u32>().ok())
        .is_some_and(|m| m >= major)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_version_resolves_to_its_image() {
        for component in Component::ALL {
            for (version, image) in component.table() {
                assert_eq!(
                    resolve(component, version).expect("listed version"),
                    *image,
                    "{component} {version}"
                );
            }
        }
    }

    #[test]
    fn defaults_are_in_their_tables() {
        for component in Component::ALL {
            assert!(
                resolve(component, component.default_version()).is_ok(),
                "{component} default"
            );
        }
    }

    #[test]
    fn unknown_version_enumerates_table_keys() {
        for component in Component::ALL {
            let err = resolve(component, "9.9").unwrap_err();
            match err {
                LocalServerError::UnsupportedVersion {
                    component: key,
                    version,
                    supported,
                } => {
                    assert_eq!(key, component.key());
                    assert_eq!(version, "9.9");
                    assert_eq!(supported.len(), component.table().len());
                    for (v, _) in component.table() {
                        assert!(supported.iter().any(|s| s == v));
                    }
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn versions_sorted_newest_first() {
        assert_eq!(
            versions(Component::Php),
            vec!["8.3", "8.2", "8.1", "8.0", "7.4"]
        );
        assert_eq!(
            versions(Component::Elasticsearch),
            vec!["7.10", "7", "6.8", "6.3", "6"]
        );
    }

    #[test]
    fn major_version_comparison() {
        assert!(major_at_least("7.10", 7));
        assert!(!major_at_least("6.8", 7));
        assert!(!major_at_least("x", 1));
    }
}
