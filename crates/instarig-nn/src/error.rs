//! Network error types.

use thiserror::Error;

use instarig_core::RigError;

/// Errors that can occur while running or persisting the network.
#[derive(Error, Debug)]
pub enum NnError {
    /// A matrix did not have the width a layer expects.
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Where the mismatch was detected.
        context: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// A checkpoint tensor is missing.
    #[error("checkpoint is missing tensor '{0}'")]
    MissingTensor(String),

    /// A checkpoint tensor has the wrong shape or inconsistent data.
    #[error("checkpoint tensor '{name}' has shape {actual:?}, expected {expected:?}")]
    CheckpointMismatch {
        /// Tensor name.
        name: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Stored shape.
        actual: Vec<usize>,
    },

    /// Error from the core crate (invalid mesh, invalid options).
    #[error(transparent)]
    Core(#[from] RigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for network operations.
pub type NnResult<T> = std::result::Result<T, NnError>;
