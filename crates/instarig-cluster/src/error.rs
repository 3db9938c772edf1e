//! Clustering error types.

use thiserror::Error;

/// Errors that can occur during clustering and loss evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// Points and per-point values have different lengths.
    #[error("length mismatch: {points} points but {values} values")]
    LengthMismatch { points: usize, values: usize },

    /// A loss was requested against an empty target set.
    #[error("target joint set is empty")]
    EmptyTargets,

    /// A loss was requested for an empty point set.
    #[error("point set is empty")]
    EmptyPoints,
}

/// A specialized Result type for clustering operations.
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
