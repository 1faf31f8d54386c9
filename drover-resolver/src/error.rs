//! Error types for drover-resolver.

use std::path::PathBuf;

use thiserror::Error;

use drover_core::PluginError;

/// All errors that can arise while resolving documents into a target table.
///
/// Any of these aborts the whole resolution before a single target executes;
/// no partial table is ever handed to the engine.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Locator scheme outside file / http(s) / object storage.
    #[error("unsupported locator scheme: {0}")]
    UnsupportedScheme(String),

    /// The locator string did not parse as a URL.
    #[error("invalid locator '{locator}': {source}")]
    InvalidLocator {
        locator: String,
        #[source]
        source: url::ParseError,
    },

    /// A filesystem path that cannot be expressed as a locator.
    #[error("path cannot be expressed as a locator: {path}")]
    InvalidPath { path: PathBuf },

    /// Filesystem failure, with the offending path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP fetch failure (transport or non-success status).
    #[error("HTTP fetch failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// Object-storage failure (open, list, or read).
    #[error("object store error for {url}: {source}")]
    Store {
        url: String,
        #[source]
        source: object_store::Error,
    },

    /// The fetched bytes did not parse as a document.
    #[error("failed to parse document at {locator}: {source}")]
    Parse {
        locator: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Structurally valid YAML that is not a valid document.
    #[error("invalid document at {locator}: {reason}")]
    InvalidDocument { locator: String, reason: String },

    /// Two documents declared the same target id.
    #[error("duplicate target '{id}' declared in {locator}")]
    DuplicateTarget { id: String, locator: String },

    /// A target body failed to build (unknown selector, bad params).
    #[error("failed to build target '{id}': {source}")]
    Target {
        id: String,
        #[source]
        source: PluginError,
    },

    /// The cancellation token was observed signaled.
    #[error("resolution cancelled")]
    Cancelled,
}

/// Convenience constructor for [`ResolveError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ResolveError {
    ResolveError::Io {
        path: path.into(),
        source,
    }
}
