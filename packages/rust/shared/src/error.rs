//! Error types for PageInsights.
//!
//! Library crates use [`PageInsightsError`] via `thiserror`.
//! The CLI binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PageInsights operations.
#[derive(Debug, thiserror::Error)]
pub enum PageInsightsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP client setup error.
    #[error("network error: {0}")]
    Network(String),

    /// Browser launch, navigation, settle or capture failure.
    #[error("render error: {0}")]
    Render(String),

    /// Generative-text service failure (transport, status, or malformed body).
    #[error("summary error: {0}")]
    Summary(String),

    /// A record for this page id is already stored.
    #[error("page '{page_id}' is already stored")]
    StoreConflict { page_id: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed stored row, invalid input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageInsightsError>;

impl PageInsightsError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a duplicate-key insert.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StoreConflict { .. })
    }
}
