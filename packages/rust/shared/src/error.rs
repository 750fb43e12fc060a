//! Error types for shopgraph.
//!
//! Library crates use [`ShopGraphError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all shopgraph operations.
#[derive(Debug, thiserror::Error)]
pub enum ShopGraphError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the graph store.
    #[error("network error: {0}")]
    Network(String),

    /// A record or store response that could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The graph store rejected or failed an operation.
    #[error("store error: {0}")]
    Store(String),

    /// The pre-ingest delete-all failed; the run was aborted.
    #[error("cleanup failed, run aborted: {0}")]
    Cleanup(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, invalid option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ShopGraphError>;

impl ShopGraphError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ShopGraphError::config("missing base_uri");
        assert_eq!(err.to_string(), "config error: missing base_uri");

        let err = ShopGraphError::Cleanup("HTTP 503".into());
        assert!(err.to_string().contains("run aborted"));
        assert!(err.to_string().contains("HTTP 503"));
    }
}
