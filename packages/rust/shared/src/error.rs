//! Error types for Curator.
//!
//! Library crates use [`CuratorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Curator operations.
#[derive(Debug, thiserror::Error)]
pub enum CuratorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a feed or enrichment signal.
    ///
    /// Transient: the selector logs and skips the affected feed or candidate.
    #[error("network error: {0}")]
    Network(String),

    /// Feed, JSON or HTML parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// State store error (unreadable or corrupt processed log / history).
    #[error("storage error: {0}")]
    Storage(String),

    /// Content generation failed or returned unusable output.
    #[error("generation error: {0}")]
    Generation(String),

    /// A page, feed or sitemap could not be rendered.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid article, bad path, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CuratorError>;

impl CuratorError {
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

    /// Whether the error is a per-feed / per-candidate failure the selector may skip.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CuratorError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = CuratorError::Generation("empty body".into());
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn transient_classification() {
        assert!(CuratorError::Network("timeout".into()).is_transient());
        assert!(CuratorError::parse("bad xml").is_transient());
        assert!(!CuratorError::Storage("corrupt".into()).is_transient());
        assert!(!CuratorError::Generation("no output".into()).is_transient());
    }
}
