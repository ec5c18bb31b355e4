//! PIN-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, PinError>;

/// Top-level error type for plant insight.
///
/// The analytics functions never produce these; only configuration loading,
/// record ingestion, window construction and output plumbing are fallible.
#[derive(Debug, Error)]
pub enum PinError {
    #[error("[PIN-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PIN-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PIN-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PIN-2001] invalid time window: {details}")]
    InvalidWindow { details: String },

    #[error("[PIN-2002] record parse failure at line {line}: {details}")]
    RecordParse { line: usize, details: String },

    #[error("[PIN-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[PIN-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PinError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PIN-1001",
            Self::MissingConfig { .. } => "PIN-1002",
            Self::ConfigParse { .. } => "PIN-1003",
            Self::InvalidWindow { .. } => "PIN-2001",
            Self::RecordParse { .. } => "PIN-2002",
            Self::Serialization { .. } => "PIN-2101",
            Self::Io { .. } => "PIN-3002",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for PinError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for PinError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
