//! Configuration options for the rigging pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};

/// Mesh preprocessing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Surface-distance radius for geodesic neighbors, in mesh units.
    pub geodesic_radius: f32,

    /// Lower bound on the geodesic radius, as a multiple of the mean
    /// mesh-edge length. `0.0` makes `geodesic_radius` absolute.
    pub min_radius_edge_lengths: f32,

    /// Keep at most this many geodesic neighbors per vertex (nearest first).
    pub max_geodesic_neighbors: Option<usize>,

    /// Whether the mesh is centred and scaled to unit size before inference.
    pub normalize: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            geodesic_radius: 0.06,
            min_radius_edge_lengths: 2.0,
            max_geodesic_neighbors: None,
            normalize: false,
        }
    }
}

impl PreprocessOptions {
    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !self.geodesic_radius.is_finite() || self.geodesic_radius < 0.0 {
            return Err(RigError::InvalidOption(format!(
                "geodesic_radius must be finite and non-negative, got {}",
                self.geodesic_radius
            )));
        }
        if !self.min_radius_edge_lengths.is_finite() || self.min_radius_edge_lengths < 0.0 {
            return Err(RigError::InvalidOption(format!(
                "min_radius_edge_lengths must be finite and non-negative, got {}",
                self.min_radius_edge_lengths
            )));
        }
        Ok(())
    }
}

/// Layer widths of the joint-prediction network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Width of the raw vertex features (positions).
    pub in_dim: usize,
    /// Width of each edge-convolution output.
    pub hidden_dim: usize,
    /// Width of the backbone feature.
    pub out_dim: usize,
    /// Hidden width of the displacement and attention heads.
    pub head_hidden_dim: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            in_dim: 3,
            hidden_dim: 128,
            out_dim: 256,
            head_hidden_dim: 128,
        }
    }
}

impl NetworkConfig {
    /// Checks that every width is non-zero.
    pub fn validate(&self) -> Result<()> {
        let widths = [
            ("in_dim", self.in_dim),
            ("hidden_dim", self.hidden_dim),
            ("out_dim", self.out_dim),
            ("head_hidden_dim", self.head_hidden_dim),
        ];
        if let Some((name, _)) = widths.iter().find(|(_, w)| *w == 0) {
            return Err(RigError::InvalidOption(format!("{name} must be non-zero")));
        }
        Ok(())
    }
}

/// Mean-shift and cluster-extraction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Number of mean-shift iterations.
    pub iterations: usize,

    /// Points with attention below this value never form or join a joint.
    pub min_attention: f32,

    /// Merge radius as a fraction of the (clamped) bandwidth.
    pub merge_ratio: f32,

    /// Joint counts above this bound are reported as ambiguous.
    pub max_joints: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            iterations: 5,
            min_attention: 1e-3,
            merge_ratio: 0.5,
            max_joints: 256,
        }
    }
}

impl ClusterOptions {
    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !self.min_attention.is_finite() || !(0.0..=1.0).contains(&self.min_attention) {
            return Err(RigError::InvalidOption(format!(
                "min_attention must lie in [0, 1], got {}",
                self.min_attention
            )));
        }
        if !self.merge_ratio.is_finite() || self.merge_ratio <= 0.0 {
            return Err(RigError::InvalidOption(format!(
                "merge_ratio must be positive, got {}",
                self.merge_ratio
            )));
        }
        Ok(())
    }
}

/// All options for one rigging run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigOptions {
    /// Mesh preprocessing.
    #[serde(default)]
    pub preprocess: PreprocessOptions,

    /// Clustering.
    #[serde(default)]
    pub cluster: ClusterOptions,
}

impl RigOptions {
    /// Checks every nested option group.
    pub fn validate(&self) -> Result<()> {
        self.preprocess.validate()?;
        self.cluster.validate()
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Saves options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
