//! Turning a converged clustering state into discrete joints.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use instarig_core::{Bandwidth, ClusterOptions};

use crate::error::ClusterResult;
use crate::mean_shift::mean_shift;

/// A predicted joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Attention-weighted mean of the member points.
    pub position: Vec3,
    /// Summed attention of the member points.
    pub weight: f32,
    /// Number of member points.
    pub members: usize,
}

/// Non-fatal conditions reported alongside a clustering result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClusterDiagnostic {
    /// The bandwidth was NaN, infinite or below the minimum and was clamped.
    BandwidthClamped { requested: f32 },
    /// Extraction produced no joints or more than the configured maximum.
    Ambiguous { joint_count: usize },
}

/// Output of [`cluster`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    /// Converged clustering state, one point per input point.
    pub converged: Vec<Vec3>,
    /// Joints in cluster creation order.
    pub joints: Vec<Joint>,
    /// Bandwidth the kernel actually used.
    pub bandwidth: f32,
    pub diagnostics: Vec<ClusterDiagnostic>,
}

struct Cluster {
    seed: Vec3,
    weighted_sum: Vec3,
    plain_sum: Vec3,
    weight: f32,
    members: usize,
}

impl Cluster {
    fn new(seed: Vec3) -> Self {
        Self {
            seed,
            weighted_sum: Vec3::ZERO,
            plain_sum: Vec3::ZERO,
            weight: 0.0,
            members: 0,
        }
    }

    fn add(&mut self, p: Vec3, a: f32) {
        self.weighted_sum += a * p;
        self.plain_sum += p;
        self.weight += a;
        self.members += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn into_joint(self) -> Joint {
        let position = if self.weight > 0.0 {
            self.weighted_sum / self.weight
        } else {
            self.plain_sum / self.members as f32
        };
        Joint {
            position,
            weight: self.weight,
            members: self.members,
        }
    }
}

/// Groups converged points into joints.
///
/// Points with attention below `min_attention` are ignored. The rest are
/// visited by descending attention (ties by index); each joins the first
/// cluster whose seed lies within `merge_radius`, or seeds a new one.
pub fn extract_joints(
    points: &[Vec3],
    attention: &[f32],
    merge_radius: f32,
    min_attention: f32,
) -> Vec<Joint> {
    let mut order: Vec<usize> = (0..points.len().min(attention.len()))
        .filter(|&i| attention[i] >= min_attention)
        .collect();
    order.sort_by(|&a, &b| attention[b].total_cmp(&attention[a]).then(a.cmp(&b)));

    let radius2 = merge_radius * merge_radius;
    let mut clusters: Vec<Cluster> = Vec::new();
    for i in order {
        let p = points[i];
        let index = match clusters
            .iter()
            .position(|c| c.seed.distance_squared(p) <= radius2)
        {
            Some(index) => index,
            None => {
                clusters.push(Cluster::new(p));
                clusters.len() - 1
            }
        };
        clusters[index].add(p, attention[i]);
    }

    clusters.into_iter().map(Cluster::into_joint).collect()
}

/// Runs mean-shift on displaced points and extracts joints.
pub fn cluster(
    points: &[Vec3],
    attention: &[f32],
    bandwidth: Bandwidth,
    options: &ClusterOptions,
) -> ClusterResult<ClusterReport> {
    let shifted = mean_shift(points, attention, bandwidth, options.iterations)?;
    let mut diagnostics = Vec::new();

    if shifted.clamped {
        log::warn!(
            "bandwidth {} clamped to {}",
            bandwidth.value(),
            shifted.bandwidth
        );
        diagnostics.push(ClusterDiagnostic::BandwidthClamped {
            requested: bandwidth.value(),
        });
    }

    let merge_radius = options.merge_ratio * shifted.bandwidth;
    let joints = extract_joints(
        &shifted.points,
        attention,
        merge_radius,
        options.min_attention,
    );

    if joints.is_empty() || joints.len() > options.max_joints {
        log::warn!(
            "ambiguous clustering: {} joints (max {})",
            joints.len(),
            options.max_joints
        );
        diagnostics.push(ClusterDiagnostic::Ambiguous {
            joint_count: joints.len(),
        });
    }

    log::debug!(
        "clustered {} points into {} joints (h = {})",
        points.len(),
        joints.len(),
        shifted.bandwidth
    );

    Ok(ClusterReport {
        converged: shifted.points,
        joints,
        bandwidth: shifted.bandwidth,
        diagnostics,
    })
}
