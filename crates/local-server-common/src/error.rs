//! Unified error types for the Local Server workspace.
//!
//! Every failure in the generator is fatal: a variant surfacing from the
//! resolver, a builder, an extension, or the validator aborts the whole
//! generation pass and no document is written.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum LocalServerError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A version selector does not appear in the supported-version table.
    #[error(
        "The configured {component} version \"{version}\" is not supported.\nTry one of the following:\n{}",
        SupportedList(supported)
    )]
    UnsupportedVersion {
        /// Versioned component (`php`, `mysql`, ...).
        component: &'static str,
        /// The rejected version selector.
        version: String,
        /// Every version the catalog accepts for this component.
        supported: Vec<String>,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The assembled document is not internally consistent.
    #[error("invalid environment document: {message}")]
    Validation {
        /// Description of the broken reference.
        message: String,
    },

    /// A compose extension failed while configuring or filtering.
    #[error("extension {id} failed: {message}")]
    Extension {
        /// Identifier the extension was declared under.
        id: String,
        /// Description of the failure.
        message: String,
    },

    /// The project configuration file is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Rendering the document failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl LocalServerError {
    /// Shorthand for a [`LocalServerError::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a [`LocalServerError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by the project configuration.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion { .. } | Self::Config { .. } | Self::Parse { .. }
        )
    }
}

struct SupportedList<'a>(&'a [String]);

impl fmt::Display for SupportedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, version) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {version}")?;
        }
        Ok(())
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LocalServerError>;
