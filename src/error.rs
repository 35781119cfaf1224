//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Cache misses and type mismatches are not errors: they surface as `None`
//! from the read operations.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Group or sub-key is empty or contains the key delimiter
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// TTL configuration could not be parsed or is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document is not valid JSON
    #[error("Malformed configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
