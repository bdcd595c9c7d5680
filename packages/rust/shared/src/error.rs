//! Error types for regfetch.
//!
//! Library crates use [`RegfetchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// Top-level error type for all regfetch operations.
#[derive(Debug, thiserror::Error)]
pub enum RegfetchError {
    /// The remote service could not be reached or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-200 status.
    #[error("protocol error: {url} returned HTTP {status}")]
    Protocol { url: String, status: u16 },

    /// An expected field could not be extracted from a response.
    #[error("extraction error: {field}: {reason}")]
    Extraction { field: String, reason: ExtractFailure },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed input (term code, department code, flag combination).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Why an extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractFailure {
    /// The pattern did not match anywhere in the source.
    NoMatch,
    /// The delimiting markers of a sub-document were missing or out of order.
    MalformedDocument(String),
    /// A named group was absent from the pattern or did not participate.
    MissingGroup(String),
    /// A named group matched, but only the empty string.
    EmptyCapture(String),
    /// A lookup table had no entry for the code.
    UnknownCode(String),
}

impl fmt::Display for ExtractFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "pattern did not match"),
            Self::MalformedDocument(detail) => write!(f, "malformed source document ({detail})"),
            Self::MissingGroup(group) => write!(f, "capture group `{group}` missing"),
            Self::EmptyCapture(group) => write!(f, "capture group `{group}` is empty"),
            Self::UnknownCode(code) => write!(f, "no entry for code `{code}`"),
        }
    }
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RegfetchError>;

impl RegfetchError {
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

    /// Create an extraction error for the named field.
    pub fn extraction(field: impl Into<String>, reason: ExtractFailure) -> Self {
        Self::Extraction {
            field: field.into(),
            reason,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for pattern/lookup failures, which usually mean an expired session.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }
}
