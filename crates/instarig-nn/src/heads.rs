//! Displacement and attention heads.

use glam::Vec3;
use ndarray::ArrayView2;
use rand::Rng;

use crate::checkpoint::{Checkpoint, Parameters};
use crate::error::{NnError, NnResult};
use crate::layers::{sigmoid, Mlp};

/// Regresses a 3D offset per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementHead {
    pub mlp: Mlp,
}

impl DisplacementHead {
    pub fn init<R: Rng>(rng: &mut R, in_dim: usize, hidden_dim: usize) -> Self {
        Self {
            mlp: Mlp::init(rng, in_dim, hidden_dim, 3),
        }
    }

    /// Returns one displacement per feature row.
    pub fn forward(&self, features: ArrayView2<'_, f32>) -> NnResult<Vec<Vec3>> {
        let out = self.mlp.forward(features)?;
        if out.ncols() != 3 {
            return Err(NnError::ShapeMismatch {
                context: "displacement head output".into(),
                expected: vec![out.nrows(), 3],
                actual: vec![out.nrows(), out.ncols()],
            });
        }
        Ok(out
            .rows()
            .into_iter()
            .map(|r| Vec3::new(r[0], r[1], r[2]))
            .collect())
    }
}

impl Parameters for DisplacementHead {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        self.mlp.save_into(prefix, checkpoint);
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        self.mlp.load_from(prefix, checkpoint)
    }
}

/// Regresses a clustering weight in `[0, 1]` per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionHead {
    pub mlp: Mlp,
}

impl AttentionHead {
    pub fn init<R: Rng>(rng: &mut R, in_dim: usize, hidden_dim: usize) -> Self {
        Self {
            mlp: Mlp::init(rng, in_dim, hidden_dim, 1),
        }
    }

    /// Returns one attention value per feature row.
    pub fn forward(&self, features: ArrayView2<'_, f32>) -> NnResult<Vec<f32>> {
        let out = self.mlp.forward(features)?;
        if out.ncols() != 1 {
            return Err(NnError::ShapeMismatch {
                context: "attention head output".into(),
                expected: vec![out.nrows(), 1],
                actual: vec![out.nrows(), out.ncols()],
            });
        }
        Ok(out.column(0).iter().map(|&logit| sigmoid(logit)).collect())
    }
}

impl Parameters for AttentionHead {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        self.mlp.save_into(prefix, checkpoint);
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        self.mlp.load_from(prefix, checkpoint)
    }
}
