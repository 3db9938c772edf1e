//! Joint-prediction network for instarig-rs.
//!
//! This crate provides the learned part of the pipeline:
//! - Dense layers and two-layer perceptrons on `ndarray` matrices
//! - The geometry-aware [`EdgeConv`] over mesh and geodesic edges
//! - The [`Backbone`] and the displacement/attention heads
//! - [`ModelParams`], the parameter bundle, and named-tensor [`Checkpoint`]s

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod backbone;
pub mod checkpoint;
pub mod edge_conv;
pub mod error;
pub mod heads;
pub mod layers;
pub mod model;

pub use backbone::Backbone;
pub use checkpoint::{Checkpoint, NamedTensor, Parameters};
pub use edge_conv::EdgeConv;
pub use error::{NnError, NnResult};
pub use heads::{AttentionHead, DisplacementHead};
pub use layers::{Linear, Mlp};
pub use model::{ModelParams, NetworkOutput};
