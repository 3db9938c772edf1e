//! The learnable mean-shift kernel bandwidth.

use serde::{Deserialize, Serialize};

/// Smallest bandwidth the clustering kernel will use.
pub const MIN_BANDWIDTH: f32 = 1e-4;

/// Mean-shift kernel radius, trained jointly with the network.
///
/// The raw value is stored as trained; [`Bandwidth::effective`] applies the
/// clamp used by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bandwidth(f32);

impl Default for Bandwidth {
    fn default() -> Self {
        Self(Self::INITIAL)
    }
}

impl Bandwidth {
    /// Initial bandwidth for freshly initialized models (unit-sized meshes).
    pub const INITIAL: f32 = 0.06;

    /// Wraps a raw bandwidth value.
    pub fn new(value: f32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn value(self) -> f32 {
        self.0
    }

    /// Returns the value the kernel uses and whether it had to be clamped.
    ///
    /// NaN and values below [`MIN_BANDWIDTH`] clamp to the minimum. Positive
    /// infinity clamps to `f32::MAX`, which still merges every point.
    pub fn effective(self) -> (f32, bool) {
        if self.0.is_finite() && self.0 >= MIN_BANDWIDTH {
            (self.0, false)
        } else if self.0.is_infinite() && self.0.is_sign_positive() {
            (f32::MAX, true)
        } else {
            (MIN_BANDWIDTH, true)
        }
    }

    /// Returns a copy scaled by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self(self.0 * factor)
    }
}
