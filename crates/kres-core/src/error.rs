//! Error types for the resolver
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the resolver
#[derive(Error, Debug)]
pub enum Error {
    /// Directory-service errors (failed lookups, unknown targets)
    #[error("Directory error: {0}")]
    Directory(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed target or dial target string
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// No directory client registered for a dial target scheme
    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    /// Async runtime errors (e.g. starting outside a tokio runtime)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a directory error
    pub fn directory(msg: impl Into<String>) -> Self {
        Self::Directory(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid target error
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Create an unknown scheme error
    pub fn unknown_scheme(scheme: impl Into<String>) -> Self {
        Self::UnknownScheme(scheme.into())
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
