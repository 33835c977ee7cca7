//! Error types for NewsLens.
//!
//! Library crates use [`NewsLensError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only [`NewsLensError::Search`] (and setup errors) ever escape a pipeline
//! run. Fetch and extraction errors are absorbed by the enricher, and model
//! errors are absorbed unless the abort policy is configured.

use std::path::PathBuf;

/// Top-level error type for all NewsLens operations.
#[derive(Debug, thiserror::Error)]
pub enum NewsLensError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid input (empty query, out-of-range setting).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The search provider failed. Aborts the whole run.
    #[error("search error: {0}")]
    Search(String),

    /// Network/HTTP error while fetching an article page.
    #[error("network error: {0}")]
    Network(String),

    /// Article text could not be extracted or summarized.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// Language model call failed or returned an unusable response.
    #[error("model error: {0}")]
    Model(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewsLensError>;

impl NewsLensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
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
        let err = NewsLensError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = NewsLensError::Search("HTTP 429 Too Many Requests".into());
        assert_eq!(err.to_string(), "search error: HTTP 429 Too Many Requests");

        let err = NewsLensError::extraction("no readable text");
        assert!(err.to_string().contains("no readable text"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NewsLensError>();
    }
}
