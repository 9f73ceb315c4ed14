//! Reverse-proxy routing rules.
//!
//! Rules are rendered into Traefik frontend labels on the owning service.
//! They are rebuilt from the current hostname configuration on every pass.

use std::fmt;

use local_server_common::constants::PROXY_NETWORK;

/// Subdomain pattern used for wildcard host matches.
pub const SUBDOMAIN_PATTERN: &str = "{subdomain:[a-z.-_]+}";

/// A single host predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMatcher {
    /// Matches the host exactly.
    Exact(String),
    /// Matches any subdomain of the host, excluding the host itself.
    Subdomains(String),
}

impl HostMatcher {
    fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self {
            Self::Exact(h) => host == h.to_ascii_lowercase(),
            Self::Subdomains(h) => {
                let suffix = format!(".{}", h.to_ascii_lowercase());
                host.strip_suffix(&suffix).is_some_and(|sub| {
                    !sub.is_empty()
                        && sub
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
                })
            }
        }
    }
}

impl fmt::Display for HostMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(h) => write!(f, "{h}"),
            Self::Subdomains(h) => write!(f, "{SUBDOMAIN_PATTERN}.{h}"),
        }
    }
}

/// How a matched request path is rewritten before forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRewrite {
    /// Remove the matched path prefix.
    StripPrefix,
    /// Prepend a prefix.
    AddPrefix(String),
    /// Regex replacement on the full path.
    Replace {
        /// Regex applied to the path.
        pattern: String,
        /// Replacement, `$$1` style back references.
        replacement: String,
    },
}

/// Host/path predicate consumed by the reverse proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    hosts: Vec<HostMatcher>,
    path_prefix: Option<String>,
    rewrite: Option<PathRewrite>,
}

impl RoutingRule {
    /// Matches exactly one host.
    pub fn host(host: impl Into<String>) -> Self {
        Self {
            hosts: vec![HostMatcher::Exact(host.into())],
            path_prefix: None,
            rewrite: None,
        }
    }

    /// Matches the primary hostname, every extra domain, and all of their
    /// subdomains.
    pub fn site<'a>(hostname: &str, extra_domains: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hosts = vec![
            HostMatcher::Exact(hostname.to_string()),
            HostMatcher::Subdomains(hostname.to_string()),
        ];
        for domain in extra_domains {
            if domain == hostname {
                continue;
            }
            hosts.push(HostMatcher::Exact(domain.to_string()));
            hosts.push(HostMatcher::Subdomains(domain.to_string()));
        }
        Self {
            hosts,
            path_prefix: None,
            rewrite: None,
        }
    }

    /// Restricts the rule to paths under `prefix`.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Rewrites matched paths.
    #[must_use]
    pub fn rewrite(mut self, rewrite: PathRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    /// Host predicates in declaration order.
    pub fn hosts(&self) -> &[HostMatcher] {
        &self.hosts
    }

    /// Whether a request for `host` and `path` is routed by this rule.
    pub fn matches(&self, host: &str, path: &str) -> bool {
        let host_ok = self.hosts.iter().any(|m| m.matches(host));
        let path_ok = self
            .path_prefix
            .as_deref()
            .is_none_or(|prefix| path.starts_with(prefix));
        host_ok && path_ok
    }
}

impl fmt::Display for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let all_exact = self
            .hosts
            .iter()
            .all(|h| matches!(h, HostMatcher::Exact(_)));
        let hosts: Vec<String> = self.hosts.iter().map(ToString::to_string).collect();
        if all_exact {
            write!(f, "Host:{}", hosts.join(","))?;
        } else {
            write!(f, "HostRegexp:{}", hosts.join(","))?;
        }

        if let Some(prefix) = &self.path_prefix {
            match &self.rewrite {
                Some(PathRewrite::StripPrefix) => write!(f, ";PathPrefixStrip:{prefix}")?,
                _ => write!(f, ";PathPrefix:{prefix}")?,
            }
        }
        match &self.rewrite {
            Some(PathRewrite::AddPrefix(p)) => write!(f, ";AddPrefix:{p}")?,
            Some(PathRewrite::Replace {
                pattern,
                replacement,
            }) => write!(f, ";ReplacePathRegex:{pattern} {replacement}")?,
            Some(PathRewrite::StripPrefix) | None => {}
        }
        Ok(())
    }
}

/// Backend protocol the proxy speaks to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTPS.
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// A proxy frontend bound to one container port.
///
/// A service with several frontends gives each one a `segment` name, which
/// namespaces its labels (`traefik.<segment>.frontend.rule`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    segment: Option<String>,
    rule: RoutingRule,
    port: u16,
    protocol: Protocol,
    priority: Option<u32>,
    pass_host_header: Option<bool>,
}

impl Router {
    /// Creates an unnamed router.
    pub const fn new(rule: RoutingRule, port: u16) -> Self {
        Self {
            segment: None,
            rule,
            port,
            protocol: Protocol::Http,
            priority: None,
            pass_host_header: None,
        }
    }

    /// Creates a named router segment.
    pub fn segment(name: impl Into<String>, rule: RoutingRule, port: u16) -> Self {
        Self {
            segment: Some(name.into()),
            ..Self::new(rule, port)
        }
    }

    /// Sets the backend protocol.
    #[must_use]
    pub const fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the frontend priority; higher values are tried first.
    #[must_use]
    pub const fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Controls forwarding of the original `Host` header.
    #[must_use]
    pub const fn pass_host_header(mut self, pass: bool) -> Self {
        self.pass_host_header = Some(pass);
        self
    }

    /// The routing predicate.
    pub const fn rule(&self) -> &RoutingRule {
        &self.rule
    }

    fn key(&self, suffix: &str) -> String {
        self.segment.as_ref().map_or_else(
            || format!("traefik.{suffix}"),
            |segment| format!("traefik.{segment}.{suffix}"),
        )
    }

    /// Renders the router into container labels.
    pub fn labels(&self) -> Vec<(String, String)> {
        let mut labels = vec![
            (
                "traefik.docker.network".to_string(),
                PROXY_NETWORK.to_string(),
            ),
            (self.key("port"), self.port.to_string()),
            (self.key("protocol"), self.protocol.to_string()),
            (self.key("frontend.rule"), self.rule.to_string()),
        ];
        if let Some(priority) = self.priority {
            labels.push((self.key("frontend.priority"), priority.to_string()));
        }
        if let Some(pass) = self.pass_host_header {
            labels.push((self.key("frontend.passHostHeader"), pass.to_string()));
        }
        labels
    }
}

/// Reads the priority of the router rendered under `segment`.
pub fn label_priority(
    labels: &std::collections::BTreeMap<String, String>,
    segment: Option<&str>,
) -> Option<u32> {
    let key = segment.map_or_else(
        || "traefik.frontend.priority".to_string(),
        |s| format!("traefik.{s}.frontend.priority"),
    );
    labels.get(&key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_rule_renders_host_regexp() {
        let rule = RoutingRule::site("acme.test.dev", []);
        assert_eq!(
            rule.to_string(),
            "HostRegexp:acme.test.dev,{subdomain:[a-z.-_]+}.acme.test.dev"
        );
    }

    #[test]
    fn site_rule_includes_extra_domains() {
        let rule = RoutingRule::site("acme.test.dev", ["acme.local"]);
        assert!(rule.matches("acme.local", "/"));
        assert!(rule.matches("blog.acme.local", "/"));
        assert!(rule.to_string().ends_with(",acme.local,{subdomain:[a-z.-_]+}.acme.local"));
    }

    #[test]
    fn site_rule_skips_duplicate_primary() {
        let rule = RoutingRule::site("acme.test.dev", ["acme.test.dev"]);
        assert_eq!(rule.hosts().len(), 2);
    }

    #[test]
    fn wildcard_requires_a_subdomain() {
        let rule = RoutingRule::site("acme.test.dev", []);
        assert!(rule.matches("acme.test.dev", "/"));
        assert!(rule.matches("en.acme.test.dev", "/wp-admin"));
        assert!(!rule.matches("notacme.test.dev", "/"));
        assert!(!rule.matches("other.dev", "/"));
    }

    #[test]
    fn exact_host_rule_with_path_strip() {
        let rule = RoutingRule::host("acme.test.dev")
            .path_prefix("/webgrind")
            .rewrite(PathRewrite::StripPrefix);
        assert_eq!(
            rule.to_string(),
            "Host:acme.test.dev;PathPrefixStrip:/webgrind"
        );
        assert!(rule.matches("acme.test.dev", "/webgrind/index.php"));
        assert!(!rule.matches("acme.test.dev", "/"));
    }

    #[test]
    fn regex_rewrite_rendering() {
        let rule = RoutingRule::site("a.dev", [])
            .path_prefix("/tachyon")
            .rewrite(PathRewrite::Replace {
                pattern: "^/tachyon/(.*)".into(),
                replacement: "/uploads/$$1".into(),
            });
        assert!(
            rule.to_string()
                .ends_with(";PathPrefix:/tachyon;ReplacePathRegex:^/tachyon/(.*) /uploads/$$1")
        );
    }

    #[test]
    fn segment_labels_are_namespaced() {
        let router = Router::segment("api", RoutingRule::host("s3-a.dev"), 9000).priority(10);
        let labels = router.labels();
        assert!(labels.iter().any(|(k, v)| k == "traefik.api.port" && v == "9000"));
        assert!(
            labels
                .iter()
                .any(|(k, v)| k == "traefik.api.frontend.rule" && v == "Host:s3-a.dev")
        );
        let map = labels.into_iter().collect();
        assert_eq!(label_priority(&map, Some("api")), Some(10));
        assert_eq!(label_priority(&map, None), None);
    }
}
