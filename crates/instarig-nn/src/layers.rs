//! Dense building blocks: linear layers and two-layer perceptrons.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::checkpoint::{join, Checkpoint, Parameters};
use crate::error::{NnError, NnResult};

/// Fully connected layer computing `x · W + b` row-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    /// Weights, `in_dim × out_dim`.
    pub weight: Array2<f32>,
    /// Bias, `out_dim`.
    pub bias: Array1<f32>,
}

impl Linear {
    /// Creates a layer with weights and bias drawn from `U(-1/sqrt(in), 1/sqrt(in))`.
    #[allow(clippy::cast_precision_loss)]
    pub fn init<R: Rng>(rng: &mut R, in_dim: usize, out_dim: usize) -> Self {
        let bound = 1.0 / (in_dim.max(1) as f32).sqrt();
        let weight = Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-bound..bound));
        let bias = Array1::from_shape_fn(out_dim, |_| rng.gen_range(-bound..bound));
        Self { weight, bias }
    }

    /// Creates a layer with all parameters set to zero.
    pub fn zeros(in_dim: usize, out_dim: usize) -> Self {
        Self {
            weight: Array2::zeros((in_dim, out_dim)),
            bias: Array1::zeros(out_dim),
        }
    }

    /// Returns the input width.
    pub fn in_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Returns the output width.
    pub fn out_dim(&self) -> usize {
        self.weight.ncols()
    }

    /// Applies the layer to every row of `x`.
    pub fn forward(&self, x: ArrayView2<'_, f32>) -> NnResult<Array2<f32>> {
        if x.ncols() != self.in_dim() {
            return Err(NnError::ShapeMismatch {
                context: "linear layer input".into(),
                expected: vec![x.nrows(), self.in_dim()],
                actual: vec![x.nrows(), x.ncols()],
            });
        }
        Ok(x.dot(&self.weight) + &self.bias)
    }
}

impl Parameters for Linear {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        checkpoint.insert_matrix(join(prefix, "weight"), &self.weight);
        checkpoint.insert_vector(join(prefix, "bias"), &self.bias);
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        let (in_dim, out_dim) = self.weight.dim();
        self.weight = checkpoint.matrix(&join(prefix, "weight"), in_dim, out_dim)?;
        self.bias = checkpoint.vector(&join(prefix, "bias"), out_dim)?;
        Ok(())
    }
}

/// Two linear layers with a ReLU in between.
#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    pub fc1: Linear,
    pub fc2: Linear,
}

impl Mlp {
    /// Creates `Linear(in → hidden) → ReLU → Linear(hidden → out)`.
    pub fn init<R: Rng>(rng: &mut R, in_dim: usize, hidden_dim: usize, out_dim: usize) -> Self {
        Self {
            fc1: Linear::init(rng, in_dim, hidden_dim),
            fc2: Linear::init(rng, hidden_dim, out_dim),
        }
    }

    /// Returns the input width.
    pub fn in_dim(&self) -> usize {
        self.fc1.in_dim()
    }

    /// Returns the output width.
    pub fn out_dim(&self) -> usize {
        self.fc2.out_dim()
    }

    /// Applies the perceptron to every row of `x`.
    pub fn forward(&self, x: ArrayView2<'_, f32>) -> NnResult<Array2<f32>> {
        let hidden = relu(self.fc1.forward(x)?);
        self.fc2.forward(hidden.view())
    }
}

impl Parameters for Mlp {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        self.fc1.save_into(&join(prefix, "fc1"), checkpoint);
        self.fc2.save_into(&join(prefix, "fc2"), checkpoint);
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        self.fc1.load_from(&join(prefix, "fc1"), checkpoint)?;
        self.fc2.load_from(&join(prefix, "fc2"), checkpoint)
    }
}

/// Concatenates matrices with equal row counts side by side.
pub fn hstack(parts: &[ArrayView2<'_, f32>]) -> NnResult<Array2<f32>> {
    ndarray::concatenate(Axis(1), parts).map_err(|_| NnError::ShapeMismatch {
        context: "feature concatenation".into(),
        expected: parts.first().map(|p| vec![p.nrows()]).unwrap_or_default(),
        actual: parts.iter().map(|p| p.nrows()).collect(),
    })
}

/// Element-wise `max(0, x)`.
pub fn relu(mut x: Array2<f32>) -> Array2<f32> {
    x.mapv_inplace(|v| v.max(0.0));
    x
}

/// Logistic function, stable for inputs of any magnitude.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
