//! Differentiable mean-shift clustering for instarig-rs.
//!
//! Displaced, attention-weighted vertices are pulled toward their local
//! modes by [`mean_shift`], then grouped into [`Joint`]s by
//! [`extract_joints`]. [`mean_shift_with_tangent`] and
//! [`chamfer_loss_with_tangent`] supply the derivative of the result with
//! respect to the bandwidth for training.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod extract;
pub mod loss;
pub mod mean_shift;

pub use error::{ClusterError, ClusterResult};
pub use extract::{cluster, extract_joints, ClusterDiagnostic, ClusterReport, Joint};
pub use loss::{chamfer_loss, chamfer_loss_with_tangent};
pub use mean_shift::{
    mean_shift, mean_shift_step, mean_shift_with_tangent, ShiftResult, TangentResult, EPSILON,
};
