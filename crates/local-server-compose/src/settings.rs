//! Raw project settings as written in `composer.json`.
//!
//! The module block lives at `extra.altis.modules.local-server`. Sibling
//! module blocks (`cloud`, `media`, `search`, `analytics`) are read only to
//! derive defaults. Nothing here applies defaults; see [`crate::resolver`].

use std::path::Path;

use local_server_common::constants::PROJECT_CONFIG_FILE;
use local_server_common::error::{LocalServerError, Result};
use serde::Deserialize;

/// A setting that is either a boolean switch or a version selector.
///
/// JSON numbers are accepted so that `"php": 8.3` and `"php": "8.3"` mean
/// the same thing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    /// `true` / `false`.
    Flag(bool),
    /// A quoted version.
    Text(String),
    /// A bare numeric version.
    Number(serde_json::Number),
}

impl Selector {
    /// The version text, if this is a version rather than a switch.
    pub fn version(&self) -> Option<String> {
        match self {
            Self::Flag(_) => None,
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Number(n) => Some(n.to_string()),
        }
    }

    /// Whether the setting turns its feature on.
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Flag(false))
    }
}

/// Node.js companion settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NodejsSettings {
    /// `"nodejs": true` runs the companion from the project root.
    Flag(bool),
    /// Full form.
    Detailed {
        /// Application directory, relative to the project root.
        #[serde(default)]
        path: Option<String>,
        /// Explicit version; falls back to `package.json` `engines.node`.
        #[serde(default)]
        version: Option<Selector>,
    },
}

/// The `local-server` module block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RawSettings {
    /// Project name; defaults to the root directory name.
    pub name: Option<String>,
    /// Top level domain.
    #[serde(alias = "domain")]
    pub tld: Option<String>,
    /// Extra domains routed to the site.
    pub domains: Vec<String>,
    /// PHP version.
    pub php: Option<Selector>,
    /// MySQL version.
    pub mysql: Option<Selector>,
    /// Object storage.
    pub s3: Option<bool>,
    /// Image transform service.
    pub tachyon: Option<bool>,
    /// Job scheduler.
    #[serde(alias = "scheduler")]
    pub cavalcade: Option<bool>,
    /// Tracing daemon.
    pub xray: Option<bool>,
    /// Analytics companions.
    pub analytics: Option<bool>,
    /// Search service switch or version.
    pub elasticsearch: Option<Selector>,
    /// Search dashboard.
    pub kibana: Option<bool>,
    /// Node.js companion.
    pub nodejs: Option<NodejsSettings>,
    /// Paths excluded from synchronized file sharing.
    pub ignore_paths: Vec<String>,
    /// Serve over HTTPS.
    pub secure: Option<bool>,
    /// Declared compose extensions, in application order.
    pub extensions: Vec<serde_json::Value>,
}

/// An `enabled` switch on a sibling module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModuleSwitch {
    /// Whether the module is on.
    pub enabled: Option<bool>,
}

/// The `cloud` module block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CloudModule {
    /// Uploads go to object storage.
    pub s3_uploads: Option<bool>,
    /// Cavalcade job runner.
    pub cavalcade: Option<bool>,
    /// X-Ray tracing.
    pub xray: Option<bool>,
}

/// The `media` module block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaModule {
    /// Tachyon image service.
    pub tachyon: Option<bool>,
}

/// Every module block that influences the environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// The `local-server` block.
    #[serde(rename = "local-server")]
    pub local_server: RawSettings,
    /// The `cloud` block.
    pub cloud: CloudModule,
    /// The `media` block.
    pub media: MediaModule,
    /// The `search` block.
    pub search: ModuleSwitch,
    /// The `analytics` block.
    pub analytics: ModuleSwitch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComposerFile {
    extra: ComposerExtra,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComposerExtra {
    altis: AltisExtra,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AltisExtra {
    modules: ProjectSettings,
}

impl ProjectSettings {
    /// Parses settings from the text of a `composer.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or a module block has
    /// the wrong shape.
    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        let file: ComposerFile =
            serde_json::from_str(text).map_err(|source| LocalServerError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(file.extra.altis.modules)
    }

    /// Loads settings from `<root>/composer.json`.
    ///
    /// A missing file yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::info!(path = %path.display(), "loading project settings");
                Self::from_json(&text, &path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no project settings, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(LocalServerError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ProjectSettings {
        ProjectSettings::from_json(json, Path::new("composer.json")).expect("should parse")
    }

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(parse("{}"), ProjectSettings::default());
    }

    #[test]
    fn reads_local_server_block() {
        let settings = parse(
            r#"{"extra":{"altis":{"modules":{"local-server":{
                "name":"acme","domain":"test.dev","php":"8.3","mysql":8.0,
                "scheduler":true,"ignore-paths":["node_modules"]
            }}}}}"#,
        );
        let ls = settings.local_server;
        assert_eq!(ls.name.as_deref(), Some("acme"));
        assert_eq!(ls.tld.as_deref(), Some("test.dev"));
        assert_eq!(ls.php.and_then(|p| p.version()).as_deref(), Some("8.3"));
        assert_eq!(ls.mysql.and_then(|p| p.version()).as_deref(), Some("8.0"));
        assert_eq!(ls.cavalcade, Some(true));
        assert_eq!(ls.ignore_paths, vec!["node_modules"]);
    }

    #[test]
    fn reads_sibling_modules() {
        let settings = parse(
            r#"{"extra":{"altis":{"modules":{
                "cloud":{"s3-uploads":false,"xray":false},
                "media":{"tachyon":false},
                "search":{"enabled":true}
            }}}}"#,
        );
        assert_eq!(settings.cloud.s3_uploads, Some(false));
        assert_eq!(settings.cloud.xray, Some(false));
        assert_eq!(settings.media.tachyon, Some(false));
        assert_eq!(settings.search.enabled, Some(true));
        assert_eq!(settings.analytics.enabled, None);
    }

    #[test]
    fn selector_forms() {
        let off: Selector = serde_json::from_str("false").expect("flag");
        assert!(!off.is_enabled());
        assert_eq!(off.version(), None);
        let v: Selector = serde_json::from_str("\"6.8\"").expect("text");
        assert!(v.is_enabled());
        assert_eq!(v.version().as_deref(), Some("6.8"));
    }

    #[test]
    fn nodejs_forms() {
        let flag: NodejsSettings = serde_json::from_str("true").expect("flag");
        assert_eq!(flag, NodejsSettings::Flag(true));
        let detailed: NodejsSettings =
            serde_json::from_str(r#"{"path":"apps/web","version":"18"}"#).expect("detailed");
        match detailed {
            NodejsSettings::Detailed { path, version } => {
                assert_eq!(path.as_deref(), Some("apps/web"));
                assert_eq!(version.and_then(|v| v.version()).as_deref(), Some("18"));
            }
            NodejsSettings::Flag(_) => panic!("expected detailed form"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ProjectSettings::from_json("{", Path::new("composer.json")).unwrap_err();
        assert!(matches!(err, LocalServerError::Parse { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ProjectSettings::load(dir.path()).expect("load");
        assert_eq!(settings, ProjectSettings::default());
    }
}
