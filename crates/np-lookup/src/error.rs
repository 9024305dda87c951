//! Error types for surface files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from opening surface files and resolving surfaces.
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Surface file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Offending file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Surface file is not valid JSON for the expected schema.
    #[error("malformed surface file {path}: {source}")]
    Json {
        /// Offending file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Requested surface name is absent from the file.
    #[error("surface '{name}' not found in {path}")]
    SurfaceNotFound {
        /// Requested surface name.
        name: String,
        /// File that was searched.
        path: PathBuf,
    },

    /// A surface failed structural validation.
    #[error("invalid surface '{name}': {reason}")]
    Invalid {
        /// Surface name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SurfaceError>;
