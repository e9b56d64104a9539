//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its append-only log.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key rejected by the configured validator
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Log file could not be opened for replay
    #[error("Cannot open log file {}: {source}", path.display())]
    ReplayOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log line decoded as JSON but not as a usable record
    #[error("Malformed log record: {0}")]
    MalformedRecord(String),

    /// I/O failure while reading or appending the log
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
