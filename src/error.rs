//! Error types for optable

use std::fmt;

#[derive(Debug, Clone)]
pub enum OpTableError {
    /// The record source rejected a page request.
    SourceError(String),
    HttpError(String),
    DatabaseError(String),
    DecodeError(String),
    InvalidInput(String),
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for OpTableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpTableError::SourceError(msg) => write!(f, "Record source error: {}", msg),
            OpTableError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            OpTableError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            OpTableError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            OpTableError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            OpTableError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            OpTableError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for OpTableError {}

impl From<std::io::Error> for OpTableError {
    fn from(err: std::io::Error) -> Self {
        OpTableError::IoError(err.to_string())
    }
}

impl From<rusqlite::Error> for OpTableError {
    fn from(err: rusqlite::Error) -> Self {
        OpTableError::DatabaseError(err.to_string())
    }
}

impl From<reqwest::Error> for OpTableError {
    fn from(err: reqwest::Error) -> Self {
        OpTableError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for OpTableError {
    fn from(err: serde_json::Error) -> Self {
        OpTableError::DecodeError(err.to_string())
    }
}

impl From<crate::config::ConfigError> for OpTableError {
    fn from(err: crate::config::ConfigError) -> Self {
        OpTableError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, OpTableError>;
