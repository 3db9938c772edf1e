//! Core types for instarig-rs.
//!
//! This crate provides the data the joint-prediction pipeline runs on:
//! - [`Mesh`], a validated triangle mesh
//! - [`GraphRecord`] and [`preprocess`], which derive the mesh-adjacency and
//!   geodesic-neighbor graphs
//! - Configuration options shared by every stage
//! - The [`Registry`] that resolves host geometry names to meshes

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod bandwidth;
pub mod error;
pub mod graph;
pub mod mesh;
pub mod options;
pub mod registry;

pub use bandwidth::{Bandwidth, MIN_BANDWIDTH};
pub use error::{Result, RigError};
pub use graph::{directed, geodesic_radius, preprocess, GraphRecord};
pub use mesh::{Mesh, NormalizeTransform};
pub use options::{ClusterOptions, NetworkConfig, PreprocessOptions, RigOptions};
pub use registry::Registry;

// Re-export glam types for convenience
pub use glam::{UVec3, Vec3};
