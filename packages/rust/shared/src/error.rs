//! Error types for RosterLink.
//!
//! Library crates use [`RosterLinkError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all RosterLink operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterLinkError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Response body or markup could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A collaborator rejected our credentials.
    #[error("{service} rejected credentials: {message}")]
    Auth { service: String, message: String },

    /// Directory service returned an error payload.
    #[error("directory error: {0}")]
    Directory(String),

    /// Search failed or timed out for a single query.
    #[error("search error: {0}")]
    Search(String),

    /// A record could not be written to the remote store. Records before
    /// `position` (1-based) are already stored; later ones were never attempted.
    #[error("failed to persist record {position} ({name}): {message}")]
    Persistence {
        position: usize,
        name: String,
        message: String,
    },

    /// Tabular export failed after the remote store was fully written.
    #[error("export error: {0}")]
    Export(String),

    /// Remote store returned a non-auth failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RosterLinkError>;

impl RosterLinkError {
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

    /// Create an auth error for the named service.
    pub fn auth(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Auth {
            service: service.into(),
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

    /// Whether a collaborator rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RosterLinkError::config("missing base id");
        assert_eq!(err.to_string(), "config error: missing base id");

        let err = RosterLinkError::auth("slack", "invalid_auth");
        assert_eq!(err.to_string(), "slack rejected credentials: invalid_auth");
        assert!(err.is_auth());
    }

    #[test]
    fn persistence_error_names_record() {
        let err = RosterLinkError::Persistence {
            position: 2,
            name: "Ada Lovelace".into(),
            message: "HTTP 422".into(),
        };
        let text = err.to_string();
        assert!(text.contains("record 2"));
        assert!(text.contains("Ada Lovelace"));
        assert!(!err.is_auth());
    }
}
