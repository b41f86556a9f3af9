//! Error types for the harmonizer.
//!
//! Library crates use [`HarmonizerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all harmonizer operations.
#[derive(Debug, thiserror::Error)]
pub enum HarmonizerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed markup or undecodable text.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A record lacks a field the merge requires.
    #[error("incomplete record: {message}")]
    Structure { message: String },

    /// The per-record overlay file does not exist.
    #[error("overlay file missing: {path:?}")]
    MissingOverlay { path: PathBuf },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A corpus root could not be walked.
    #[error("corpus error: {0}")]
    Corpus(String),

    /// Writing a document back to markup failed.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// The schema validator could not be run.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HarmonizerError>;

impl HarmonizerError {
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

    /// Create a structural error for a record missing a required field.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure {
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

    /// Whether this error aborts a whole run rather than a single record.
    pub fn is_resource_failure(&self) -> bool {
        matches!(self, Self::Corpus(_) | Self::Config { .. })
    }
}
