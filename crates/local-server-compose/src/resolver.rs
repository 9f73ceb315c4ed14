//! Configuration resolution.
//!
//! Merges the raw project settings with the built-in defaults, validates every
//! version selector against the catalog, and produces the immutable
//! [`ProjectConfig`] every service builder reads from.
//!
//! Feature defaults (the single source of truth):
//!
//! | setting | default |
//! |---|---|
//! | `s3` | `cloud.s3-uploads`, else on |
//! | `tachyon` | `media.tachyon`, else on; requires `s3` |
//! | `cavalcade` | `cloud.cavalcade`, else on |
//! | `xray` | `cloud.xray`, else on |
//! | `analytics` | `analytics.enabled`, else off; requires search |
//! | `elasticsearch` | version `7` if `search` or `analytics` is enabled, else off |
//! | `kibana` | on if `search` or `analytics` is enabled; requires search |
//! | `nodejs` | off |

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use local_server_common::config::EnvironmentOverrides;
use local_server_common::constants::{self, DEFAULT_TLD};
use local_server_common::error::{LocalServerError, Result};
use local_server_common::types::GeneratorArgs;

use crate::catalog::{self, Component};
use crate::settings::{NodejsSettings, ProjectSettings, Selector};

/// Node.js companion configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodejsConfig {
    /// Application directory relative to the project root.
    pub path: String,
    /// Resolved major version.
    pub version: String,
}

/// Resolved feature switches.
///
/// Dependent features are already folded in: `tachyon` is off when `s3` is,
/// and `analytics`/`kibana` are off without a search version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
    /// Object storage and bucket bootstrap.
    pub s3: bool,
    /// Image transform service.
    pub tachyon: bool,
    /// Job scheduler.
    pub cavalcade: bool,
    /// Tracing daemon.
    pub xray: bool,
    /// Analytics companions.
    pub analytics: bool,
    /// Search version, `None` when search is off.
    pub elasticsearch: Option<String>,
    /// Search dashboard.
    pub kibana: bool,
}

/// Fully resolved configuration for one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// DNS-label-safe project name.
    pub name: String,
    /// Top level domain.
    pub tld: String,
    /// Primary hostname (`<name>.<tld>`).
    pub hostname: String,
    /// Project root on the host.
    pub root: PathBuf,
    /// Directory holding static service config files.
    pub config_dir: PathBuf,
    /// Extra domains routed to the site.
    pub domains: Vec<String>,
    /// PHP version selector.
    pub php_version: String,
    /// MySQL version selector.
    pub mysql_version: String,
    /// Feature switches.
    pub features: Features,
    /// Node.js companion.
    pub nodejs: Option<NodejsConfig>,
    /// Paths excluded from file sync.
    pub ignore_paths: Vec<String>,
    /// Declared extension identifiers, in application order.
    pub extensions: Vec<String>,
    /// Per-invocation switches.
    pub args: GeneratorArgs,
    /// Environment-derived values.
    pub overrides: EnvironmentOverrides,
}

impl ProjectConfig {
    /// The project root as a mount source string.
    pub fn root_str(&self) -> String {
        self.root.display().to_string()
    }

    /// Path of a static config file as a mount source string.
    pub fn config_file(&self, file: &str) -> String {
        self.config_dir.join(file).display().to_string()
    }

    /// Container name for `service`.
    pub fn container_name(&self, service: &str) -> String {
        format!("{}-{service}", self.name)
    }

    /// Auxiliary hostname such as `s3-<hostname>`.
    pub fn prefixed_host(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.hostname)
    }

    /// Object storage bucket name.
    pub fn bucket(&self) -> String {
        format!("s3-{}", self.name)
    }

    /// URL scheme for generated URLs.
    pub const fn scheme(&self) -> &'static str {
        if self.args.secure { "https" } else { "http" }
    }

    /// Every hostname the proxy should answer for, used for certificates.
    pub fn all_hostnames(&self) -> Vec<String> {
        let mut hosts = vec![self.hostname.clone(), format!("*.{}", self.hostname)];
        for prefix in ["s3", "s3-console", "cognito", "pinpoint", "elasticsearch", "node"] {
            hosts.push(self.prefixed_host(prefix));
        }
        for domain in &self.domains {
            hosts.push(domain.clone());
            hosts.push(format!("*.{domain}"));
        }
        hosts
    }
}

/// Strips every character outside `[A-Za-z0-9_-]`.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// Resolves the raw settings into a [`ProjectConfig`].
///
/// # Errors
///
/// Returns [`LocalServerError::UnsupportedVersion`] for unknown version
/// selectors and [`LocalServerError::Config`] for an unusable project name
/// or malformed extension declarations.
pub fn resolve(
    settings: &ProjectSettings,
    root: &Path,
    mut args: GeneratorArgs,
    overrides: EnvironmentOverrides,
) -> Result<ProjectConfig> {
    let raw = &settings.local_server;

    let raw_name = raw.name.clone().unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let name = normalize_name(&raw_name);
    if name.is_empty() {
        return Err(LocalServerError::config(format!(
            "project name \"{raw_name}\" contains no usable characters"
        )));
    }

    let tld = raw
        .tld
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TLD)
        .to_string();
    let hostname = format!("{name}.{tld}");

    let php_version = version_setting(Component::Php, raw.php.as_ref())?;
    let mysql_version = version_setting(Component::Mysql, raw.mysql.as_ref())?;

    let features = resolve_features(settings)?;
    let nodejs = match &raw.nodejs {
        Some(nodejs) => resolve_nodejs(nodejs, root)?,
        None => None,
    };
    let extensions = resolve_extensions(&raw.extensions)?;

    if let Some(secure) = raw.secure {
        args.secure = secure;
    }

    let config = ProjectConfig {
        name,
        tld,
        hostname,
        root: root.to_path_buf(),
        config_dir: constants::config_dir(root),
        domains: dedupe(&raw.domains),
        php_version,
        mysql_version,
        features,
        nodejs,
        ignore_paths: raw.ignore_paths.clone(),
        extensions,
        args,
        overrides,
    };
    tracing::info!(
        hostname = %config.hostname,
        php = %config.php_version,
        mysql = %config.mysql_version,
        "resolved project configuration"
    );
    tracing::debug!(features = ?config.features, "resolved features");
    Ok(config)
}

fn version_setting(component: Component, selector: Option<&Selector>) -> Result<String> {
    let version = match selector {
        None | Some(Selector::Flag(true)) => component.default_version().to_string(),
        Some(Selector::Flag(false)) => {
            return Err(LocalServerError::config(format!(
                "{component} cannot be disabled"
            )));
        }
        Some(s) => s.version().unwrap_or_default(),
    };
    check_selected(component, &version, selector)?;
    Ok(version)
}

/// Checks `version` against the catalog, naming the quoted form when a bare
/// JSON number lost a trailing zero (`7.10` parses as `7.1`).
fn check_selected(
    component: Component,
    version: &str,
    selector: Option<&Selector>,
) -> Result<()> {
    let err = match catalog::check(component, version) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if !matches!(selector, Some(Selector::Number(_))) {
        return Err(err);
    }
    let quoted = catalog::versions(component)
        .into_iter()
        .find(|key| key.contains('.') && key.trim_end_matches('0') == version);
    match quoted {
        Some(key) => Err(LocalServerError::config(format!(
            "{component} version {version} was written as a bare number; quote it as \"{key}\""
        ))),
        None => Err(err),
    }
}

fn resolve_features(settings: &ProjectSettings) -> Result<Features> {
    let raw = &settings.local_server;
    let search_enabled = settings.search.enabled.unwrap_or(false);
    let analytics_enabled = settings.analytics.enabled.unwrap_or(false);
    let search_default = search_enabled || analytics_enabled;

    let elasticsearch = match &raw.elasticsearch {
        None if search_default => Some(Component::Elasticsearch.default_version().to_string()),
        None | Some(Selector::Flag(false)) => None,
        Some(Selector::Flag(true)) => Some(Component::Elasticsearch.default_version().to_string()),
        Some(s) => s.version(),
    };
    if let Some(version) = &elasticsearch {
        check_selected(Component::Elasticsearch, version, raw.elasticsearch.as_ref())?;
        catalog::check(Component::Kibana, version)?;
    }
    let search_on = elasticsearch.is_some();

    let s3 = raw
        .s3
        .or(settings.cloud.s3_uploads)
        .unwrap_or(true);
    let tachyon = raw.tachyon.or(settings.media.tachyon).unwrap_or(true);

    Ok(Features {
        s3,
        tachyon: s3 && tachyon,
        cavalcade: raw.cavalcade.or(settings.cloud.cavalcade).unwrap_or(true),
        xray: raw.xray.or(settings.cloud.xray).unwrap_or(true),
        analytics: search_on && raw.analytics.unwrap_or(analytics_enabled),
        kibana: search_on && raw.kibana.unwrap_or(search_default),
        elasticsearch,
    })
}

fn resolve_nodejs(settings: &NodejsSettings, root: &Path) -> Result<Option<NodejsConfig>> {
    let (path, version) = match settings {
        NodejsSettings::Flag(false) => return Ok(None),
        NodejsSettings::Flag(true) => (".".to_string(), None),
        NodejsSettings::Detailed { path, version } => (
            path.clone().unwrap_or_else(|| ".".into()),
            version.as_ref().and_then(Selector::version),
        ),
    };

    let version = match version {
        Some(v) => v,
        None => manifest_node_version(&root.join(&path).join("package.json")),
    };
    catalog::check(Component::Nodejs, &version)?;
    Ok(Some(NodejsConfig { path, version }))
}

/// Reads the major Node.js version hinted by `engines.node` in a manifest.
///
/// A missing manifest or hint is not fatal: the default version is returned
/// and a warning is logged.
fn manifest_node_version(manifest: &Path) -> String {
    let fallback = Component::Nodejs.default_version().to_string();
    let text = match std::fs::read_to_string(manifest) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                path = %manifest.display(),
                error = %e,
                default = %fallback,
                "cannot read Node.js manifest, using default version"
            );
            return fallback;
        }
    };
    let hint = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.pointer("/engines/node").and_then(|n| n.as_str().map(str::to_string)));
    match hint.as_deref().and_then(major_from_range) {
        Some(major) => major,
        None => {
            tracing::warn!(
                path = %manifest.display(),
                default = %fallback,
                "Node.js manifest has no engines.node version hint, using default version"
            );
            fallback
        }
    }
}

/// First major version mentioned in a semver range such as `>=18.0.0`.
fn major_from_range(range: &str) -> Option<String> {
    let start = range.find(|c: char| c.is_ascii_digit())?;
    let digits: String = range[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    Some(digits)
}

fn resolve_extensions(declared: &[serde_json::Value]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut extensions = Vec::with_capacity(declared.len());
    for value in declared {
        let id = value
            .as_str()
            .filter(|id| is_package_name(id))
            .ok_or_else(|| {
                LocalServerError::config(format!(
                    "malformed extension declaration {value}: expected a \"vendor/package\" string"
                ))
            })?;
        if !seen.insert(id) {
            return Err(LocalServerError::config(format!(
                "extension \"{id}\" is declared more than once"
            )));
        }
        extensions.push(id.to_string());
    }
    Ok(extensions)
}

fn is_package_name(id: &str) -> bool {
    let valid = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    matches!(id.split_once('/'), Some((vendor, package)) if valid(vendor) && valid(package))
}

fn dedupe(domains: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    domains
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty() && seen.insert(d.clone()))
        .collect()
}
