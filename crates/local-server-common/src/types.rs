//! Domain primitive types used across the Local Server workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Xdebug mode string passed through to the PHP containers.
///
/// Mirrors Xdebug's own `xdebug.mode` syntax: a comma separated list such as
/// `debug`, `profile` or `debug,profile`, or `off`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XdebugMode(String);

impl XdebugMode {
    /// Creates a mode from its textual form.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        if mode.trim().is_empty() {
            return Self::off();
        }
        Self(mode)
    }

    /// Xdebug disabled.
    #[must_use]
    pub fn off() -> Self {
        Self("off".into())
    }

    /// Whether any Xdebug mode is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0 != "off"
    }

    /// Whether the profiler is among the active modes.
    #[must_use]
    pub fn includes_profiling(&self) -> bool {
        self.0.split(',').any(|m| m.trim() == "profile")
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for XdebugMode {
    fn default() -> Self {
        Self::off()
    }
}

impl fmt::Display for XdebugMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Readiness condition attached to a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyCondition {
    /// The dependency container has been started.
    ServiceStarted,
    /// The dependency reports healthy via its healthcheck.
    ServiceHealthy,
    /// The dependency ran to completion with exit code 0.
    ServiceCompletedSuccessfully,
}

impl fmt::Display for DependencyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceStarted => write!(f, "service_started"),
            Self::ServiceHealthy => write!(f, "service_healthy"),
            Self::ServiceCompletedSuccessfully => write!(f, "service_completed_successfully"),
        }
    }
}

/// Runtime switches that modify generation for a single invocation.
///
/// These come from CLI flags rather than the project configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorArgs {
    /// Active Xdebug mode.
    pub xdebug: XdebugMode,
    /// Whether file sharing goes through a synchronized volume.
    pub mutagen: bool,
    /// Whether the runtime `/tmp` is bind-mounted to `<root>/.tmp`.
    pub tmp: bool,
    /// Whether the site is served over HTTPS.
    pub secure: bool,
}

impl Default for GeneratorArgs {
    fn default() -> Self {
        Self {
            xdebug: XdebugMode::off(),
            mutagen: false,
            tmp: false,
            secure: true,
        }
    }
}
