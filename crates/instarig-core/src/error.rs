//! Error types for instarig-rs.

use thiserror::Error;

/// The main error type for instarig-core operations.
#[derive(Error, Debug)]
pub enum RigError {
    /// The mesh is malformed (no vertices, out-of-range face indices).
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An option holds a non-finite or out-of-range value.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// A mesh with the given name is already registered.
    #[error("mesh '{0}' already exists")]
    MeshExists(String),

    /// A mesh with the given name was not found.
    #[error("mesh '{0}' not found")]
    MeshNotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for instarig-core operations.
pub type Result<T> = std::result::Result<T, RigError>;
