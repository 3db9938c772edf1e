//! Training data and the bandwidth update step.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use instarig_cluster::{chamfer_loss, chamfer_loss_with_tangent, mean_shift, mean_shift_with_tangent};
use instarig_core::{Bandwidth, Mesh, RigError, RigOptions, MIN_BANDWIDTH};
use instarig_nn::ModelParams;

use crate::loader::load_obj;
use crate::pipeline::infer;
use crate::{Error, Result};

/// A mesh with its ground-truth joint positions.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonSample {
    pub mesh: Mesh,
    pub joints: Vec<Vec3>,
}

/// One manifest line: an OBJ file and its joints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path to the OBJ file, relative to the manifest's directory.
    pub obj_path: PathBuf,
    pub joints: Vec<Vec3>,
}

/// An indexable collection of training samples.
#[derive(Debug, Clone, Default)]
pub struct SkeletonDataset {
    samples: Vec<SkeletonSample>,
}

impl SkeletonDataset {
    pub fn new(samples: Vec<SkeletonSample>) -> Self {
        Self { samples }
    }

    /// Loads every entry of a JSON manifest.
    pub fn load_manifest(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let samples = entries
            .into_iter()
            .map(|entry| {
                Ok(SkeletonSample {
                    mesh: load_obj(base.join(&entry.obj_path))?,
                    joints: entry.joints,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!("loaded {} samples from {}", samples.len(), path.display());
        Ok(Self { samples })
    }

    pub fn push(&mut self, sample: SkeletonSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample at `index`.
    pub fn get(&self, index: usize) -> Result<&SkeletonSample> {
        self.samples.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.samples.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkeletonSample> {
        self.samples.iter()
    }
}

/// Outcome of one bandwidth update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Loss before the update.
    pub loss: f32,
    /// `∂loss/∂h` at the old bandwidth.
    pub gradient: f32,
    pub bandwidth_before: f32,
    pub bandwidth_after: f32,
    /// Loss with the updated bandwidth.
    pub loss_after: f32,
}

/// Gradient descent on the mean-shift bandwidth against ground-truth joints.
///
/// The loss is the symmetric Chamfer distance between the converged
/// clustering state and the sample's joints. Network weights are left as is.
#[derive(Debug, Clone, Default)]
pub struct BandwidthTrainer {
    options: RigOptions,
}

impl BandwidthTrainer {
    pub fn new(options: RigOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &RigOptions {
        &self.options
    }

    /// Evaluates the loss for a sample without changing anything.
    pub fn loss(&self, params: &ModelParams, sample: &SkeletonSample) -> Result<f32> {
        let inference = infer(&sample.mesh, params, &self.options)?;
        let targets: Vec<Vec3> = sample
            .joints
            .iter()
            .map(|&j| inference.to_model_space(j))
            .collect();
        let shifted = mean_shift(
            &inference.displaced,
            &inference.attention,
            params.bandwidth,
            self.options.cluster.iterations,
        )?;
        Ok(chamfer_loss(&shifted.points, &targets)?)
    }

    /// Applies one gradient-descent update with learning rate `lr`.
    ///
    /// The updated bandwidth stays within `[MIN_BANDWIDTH, f32::MAX]`; a NaN
    /// update falls back to [`MIN_BANDWIDTH`].
    pub fn step(
        &self,
        params: &mut ModelParams,
        sample: &SkeletonSample,
        lr: f32,
    ) -> Result<StepReport> {
        if !lr.is_finite() || lr < 0.0 {
            return Err(RigError::InvalidOption(format!(
                "learning rate must be finite and non-negative, got {lr}"
            ))
            .into());
        }

        let inference = infer(&sample.mesh, params, &self.options)?;
        let targets: Vec<Vec3> = sample
            .joints
            .iter()
            .map(|&j| inference.to_model_space(j))
            .collect();
        let iterations = self.options.cluster.iterations;

        let before = params.bandwidth;
        let shifted = mean_shift_with_tangent(
            &inference.displaced,
            &inference.attention,
            before,
            iterations,
        )?;
        let (loss, gradient) =
            chamfer_loss_with_tangent(&shifted.points, &shifted.tangents, &targets)?;

        let raw = before.value() - lr * gradient;
        let updated = Bandwidth::new(if raw.is_nan() {
            MIN_BANDWIDTH
        } else {
            raw.clamp(MIN_BANDWIDTH, f32::MAX)
        });
        params.bandwidth = updated;

        let after = mean_shift(&inference.displaced, &inference.attention, updated, iterations)?;
        let loss_after = chamfer_loss(&after.points, &targets)?;

        log::info!(
            "bandwidth step: h {} -> {}, loss {} -> {} (grad {})",
            before.value(),
            updated.value(),
            loss,
            loss_after,
            gradient
        );

        Ok(StepReport {
            loss,
            gradient,
            bandwidth_before: before.value(),
            bandwidth_after: updated.value(),
            loss_after,
        })
    }

    /// Runs one step per sample, in order, and returns the reports.
    ///
    /// If any step fails, the bandwidth is restored to its value before the
    /// epoch.
    pub fn epoch(
        &self,
        params: &mut ModelParams,
        dataset: &SkeletonDataset,
        lr: f32,
    ) -> Result<Vec<StepReport>> {
        let start = params.bandwidth;
        let reports = dataset
            .iter()
            .map(|sample| self.step(params, sample, lr))
            .collect::<Result<Vec<_>>>();
        if reports.is_err() {
            log::warn!("epoch failed, bandwidth restored to {}", start.value());
            params.bandwidth = start;
        }
        reports
    }
}
