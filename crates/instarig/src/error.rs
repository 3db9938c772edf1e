//! Top-level error type.

use thiserror::Error;

use instarig_cluster::ClusterError;
use instarig_core::RigError;
use instarig_nn::NnError;

/// Any error the rigging pipeline can produce.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid mesh, invalid options, or unknown mesh handle.
    #[error(transparent)]
    Core(#[from] RigError),

    /// Network evaluation or checkpoint failure.
    #[error(transparent)]
    Network(#[from] NnError),

    /// Clustering or loss failure.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// The OBJ file could not be read.
    #[error("failed to load OBJ file: {0}")]
    ObjLoad(#[from] tobj::LoadError),

    /// A dataset sample was requested past the end.
    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for instarig operations.
pub type Result<T> = std::result::Result<T, Error>;
