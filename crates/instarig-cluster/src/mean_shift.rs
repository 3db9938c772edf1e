//! Attention-weighted mean-shift with a truncated quadratic kernel.
//!
//! One iteration replaces every point by
//!
//! ```text
//! p'[i] = Σ_j w[i][j] · p[j] / (Σ_j w[i][j] + ε)
//! w[i][j] = a[j] · max(0, 1 - |p[i] - p[j]|² / h²)
//! ```
//!
//! with all points updated simultaneously from the previous iterate.
//!
//! [`mean_shift_with_tangent`] additionally carries `∂p/∂h` through every
//! iteration so the bandwidth can be trained.

use glam::Vec3;
use instarig_core::Bandwidth;

use crate::error::{ClusterError, ClusterResult};

/// Denominator guard for the weighted average.
pub const EPSILON: f32 = 1e-8;

/// Points after mean-shift, with the bandwidth that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftResult {
    /// Converged clustering state, one point per input point.
    pub points: Vec<Vec3>,
    /// Bandwidth the kernel actually used.
    pub bandwidth: f32,
    /// Whether the requested bandwidth had to be clamped.
    pub clamped: bool,
}

/// [`ShiftResult`] plus the derivative of every point with respect to the
/// bandwidth.
#[derive(Debug, Clone, PartialEq)]
pub struct TangentResult {
    pub points: Vec<Vec3>,
    /// `∂p/∂h` per point. Zero everywhere when the bandwidth was clamped.
    pub tangents: Vec<Vec3>,
    pub bandwidth: f32,
    pub clamped: bool,
}

fn check_lengths(points: &[Vec3], attention: &[f32]) -> ClusterResult<()> {
    if points.len() != attention.len() {
        return Err(ClusterError::LengthMismatch {
            points: points.len(),
            values: attention.len(),
        });
    }
    Ok(())
}

/// Runs `iterations` mean-shift steps.
pub fn mean_shift(
    points: &[Vec3],
    attention: &[f32],
    bandwidth: Bandwidth,
    iterations: usize,
) -> ClusterResult<ShiftResult> {
    check_lengths(points, attention)?;
    let (h, clamped) = bandwidth.effective();

    let mut current = points.to_vec();
    for _ in 0..iterations {
        current = shift_once(&current, attention, h);
    }

    Ok(ShiftResult {
        points: current,
        bandwidth: h,
        clamped,
    })
}

/// One simultaneous update of every point, with the bandwidth clamped as in
/// [`mean_shift`].
pub fn mean_shift_step(
    points: &[Vec3],
    attention: &[f32],
    bandwidth: Bandwidth,
) -> ClusterResult<Vec<Vec3>> {
    check_lengths(points, attention)?;
    let (h, _) = bandwidth.effective();
    Ok(shift_once(points, attention, h))
}

/// `h` must be positive and `attention` as long as `points`.
fn shift_once(points: &[Vec3], attention: &[f32], h: f32) -> Vec<Vec3> {
    let inv_h2 = 1.0 / (h * h);
    points
        .iter()
        .map(|&p_i| {
            let mut numerator = Vec3::ZERO;
            let mut denominator = 0.0;
            for (&p_j, &a_j) in points.iter().zip(attention) {
                let k = (1.0 - p_i.distance_squared(p_j) * inv_h2).max(0.0);
                let w = a_j * k;
                numerator += w * p_j;
                denominator += w;
            }
            numerator / (denominator + EPSILON)
        })
        .collect()
}

/// Runs `iterations` mean-shift steps, propagating `∂p/∂h` alongside.
pub fn mean_shift_with_tangent(
    points: &[Vec3],
    attention: &[f32],
    bandwidth: Bandwidth,
    iterations: usize,
) -> ClusterResult<TangentResult> {
    check_lengths(points, attention)?;
    let (h, clamped) = bandwidth.effective();
    // A clamped bandwidth no longer depends on the raw value.
    let dh = if clamped { 0.0 } else { 1.0 };

    let mut current = points.to_vec();
    let mut tangents = vec![Vec3::ZERO; points.len()];
    for _ in 0..iterations {
        (current, tangents) = tangent_step(&current, &tangents, attention, h, dh);
    }

    Ok(TangentResult {
        points: current,
        tangents,
        bandwidth: h,
        clamped,
    })
}

/// One update of points and tangents.
///
/// Inside the kernel support `k = 1 - d²/h²`, so
/// `k̇ = 2·d²·ḣ/h³ - (d²)˙/h²` with `(d²)˙ = 2·(p_i - p_j)·(ṗ_i - ṗ_j)`.
/// The new point is `N / D`; its tangent follows the quotient rule.
fn tangent_step(
    points: &[Vec3],
    tangents: &[Vec3],
    attention: &[f32],
    h: f32,
    dh: f32,
) -> (Vec<Vec3>, Vec<Vec3>) {
    let h2 = h * h;
    let h3 = h2 * h;

    points
        .iter()
        .zip(tangents)
        .map(|(&p_i, &t_i)| {
            let mut n = Vec3::ZERO;
            let mut n_dot = Vec3::ZERO;
            let mut d = EPSILON;
            let mut d_dot = 0.0;

            for ((&p_j, &t_j), &a_j) in points.iter().zip(tangents).zip(attention) {
                let diff = p_i - p_j;
                let d2 = diff.length_squared();
                if d2 >= h2 {
                    continue;
                }
                let k = 1.0 - d2 / h2;
                let d2_dot = 2.0 * diff.dot(t_i - t_j);
                let k_dot = 2.0 * d2 * dh / h3 - d2_dot / h2;

                let w = a_j * k;
                let w_dot = a_j * k_dot;
                n += w * p_j;
                n_dot += w_dot * p_j + w * t_j;
                d += w;
                d_dot += w_dot;
            }

            let p = n / d;
            let t = (n_dot * d - n * d_dot) / (d * d);
            (p, t)
        })
        .unzip()
}
