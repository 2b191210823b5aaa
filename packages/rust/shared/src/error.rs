//! Error types for certsweep.
//!
//! Library crates use [`CertsweepError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The crawl-facing variants map onto the failure taxonomy the pipeline
//! recovers from locally: an invalid URL skips one item, a fetch failure
//! skips one page, an extraction failure scans as empty text, and a task
//! failure leaves one organization's record unmodified.

use std::path::PathBuf;

/// Top-level error type for all certsweep operations.
#[derive(Debug, thiserror::Error)]
pub enum CertsweepError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A URL that could not be validated (malformed or unsupported scheme).
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// HTTP fetch failure: transport error, timeout, bad status, or
    /// retries exhausted.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Content extraction failure (oversized or unreadable PDF, etc.).
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// A site-crawl task died unexpectedly (panic or cancellation).
    #[error("crawl task failed: {0}")]
    Task(String),

    /// CSV record table error (missing columns, malformed rows).
    #[error("records error: {0}")]
    Records(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CertsweepError>;

impl CertsweepError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create a fetch error with the offending URL for context.
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
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
        let err = CertsweepError::config("missing input file");
        assert_eq!(err.to_string(), "config error: missing input file");

        let err = CertsweepError::invalid_url("ftp://example.com");
        assert_eq!(err.to_string(), "invalid URL: ftp://example.com");

        let err = CertsweepError::fetch("http://example.com", "HTTP 404");
        assert!(err.to_string().contains("http://example.com"));
        assert!(err.to_string().contains("HTTP 404"));
    }
}
