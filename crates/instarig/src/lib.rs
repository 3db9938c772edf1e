//! instarig: learned auto-rigging for 3D character meshes.
//!
//! A graph neural network reads a triangle mesh, predicts a displacement and
//! an attention value for every vertex, and a differentiable mean-shift pulls
//! the displaced, attention-weighted vertices together into skeletal joints.
//!
//! # Quick Start
//!
//! ```no_run
//! use instarig::*;
//!
//! fn main() -> Result<()> {
//!     init();
//!
//!     let params = ModelParams::load(NetworkConfig::default(), "model.json")?;
//!     let mut context = Context::new();
//!     let body = context.register_mesh("body", load_obj("body.obj")?)?;
//!
//!     let skeleton = context.generate_skeleton(&body, &params, SymmetryAxis::X, DetailLevel::Medium)?;
//!     for joint in &skeleton.joints {
//!         println!("{}: {}", joint.name, joint.position);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! - [`preprocess`] builds the mesh-adjacency and geodesic graphs
//! - [`ModelParams::forward`] runs the backbone and both heads
//! - [`cluster`] runs mean-shift and extracts [`Joint`]s
//! - [`predict_joints`] chains the three
//!
//! [`BandwidthTrainer`] fits the mean-shift bandwidth to ground-truth joints.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod context;
mod error;
mod init;
mod loader;
mod pipeline;
mod train;

pub use context::{
    name_joints, Context, DetailLevel, MeshHandle, NamedJoint, Skeleton, SymmetryAxis,
};
pub use error::{Error, Result};
pub use init::init;
pub use loader::load_obj;
pub use pipeline::{predict_joints, predict_with_bandwidth, Prediction};
pub use train::{BandwidthTrainer, ManifestEntry, SkeletonDataset, SkeletonSample, StepReport};

// Re-export core types
pub use instarig_core::{
    directed, preprocess, Bandwidth, ClusterOptions, GraphRecord, Mesh, NetworkConfig,
    NormalizeTransform, PreprocessOptions, Registry, RigError, RigOptions, UVec3, Vec3,
    MIN_BANDWIDTH,
};

// Re-export network types
pub use instarig_nn::{Checkpoint, ModelParams, NetworkOutput, NnError};

// Re-export clustering types
pub use instarig_cluster::{
    chamfer_loss, cluster, extract_joints, mean_shift, mean_shift_with_tangent, ClusterDiagnostic,
    ClusterError, ClusterReport, Joint,
};
