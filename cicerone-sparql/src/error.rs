//! Error types for SPARQL operations
//!
//! This module defines custom error types for the cicerone-sparql library,
//! covering endpoint connectivity, query execution, field configuration and
//! cache storage.

use thiserror::Error;

/// Main error type for SPARQL operations
#[derive(Error, Debug)]
pub enum SparqlError {
    /// Connection error - endpoint unreachable at construction time
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query execution error - a rendered query failed at runtime
    #[error("Query error: {0}")]
    QueryError(String),

    /// A lookup that must yield a row yielded none
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error - malformed field definitions or TTL strings
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Cache storage error - disk I/O failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for SPARQL operations
pub type Result<T> = std::result::Result<T, SparqlError>;

impl From<String> for SparqlError {
    fn from(s: String) -> Self {
        SparqlError::Other(s)
    }
}

impl From<&str> for SparqlError {
    fn from(s: &str) -> Self {
        SparqlError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for SparqlError {
    fn from(e: serde_json::Error) -> Self {
        SparqlError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for SparqlError {
    fn from(e: serde_yaml::Error) -> Self {
        SparqlError::ConfigError(e.to_string())
    }
}
