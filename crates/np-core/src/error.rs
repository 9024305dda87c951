//! Error types for NanoPost

use thiserror::Error;

/// NanoPost error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid module configuration (fatal at job setup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output branch misuse: duplicate declaration, type or length
    /// mismatch, or an unfilled branch at the end of an event
    #[error("Branch error: {0}")]
    Branch(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
