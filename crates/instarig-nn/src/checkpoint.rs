//! Flat named-tensor checkpoints.
//!
//! Parameters are stored as a map from dotted names
//! (`backbone.conv1.mesh.fc1.weight`) to a shape and row-major data, and
//! serialized as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{NnError, NnResult};

/// A single stored tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTensor {
    /// Tensor dimensions.
    pub shape: Vec<usize>,
    /// Row-major values.
    pub data: Vec<f32>,
}

/// A named-tensor snapshot of model parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    tensors: BTreeMap<String, NamedTensor>,
}

impl Checkpoint {
    /// Creates an empty checkpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns true if no tensors are stored.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Returns the stored tensor names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Returns a stored tensor.
    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.tensors.get(name)
    }

    /// Stores a matrix.
    pub fn insert_matrix(&mut self, name: impl Into<String>, matrix: &Array2<f32>) {
        let (rows, cols) = matrix.dim();
        self.tensors.insert(
            name.into(),
            NamedTensor {
                shape: vec![rows, cols],
                data: matrix.iter().copied().collect(),
            },
        );
    }

    /// Stores a vector.
    pub fn insert_vector(&mut self, name: impl Into<String>, vector: &Array1<f32>) {
        self.tensors.insert(
            name.into(),
            NamedTensor {
                shape: vec![vector.len()],
                data: vector.to_vec(),
            },
        );
    }

    /// Stores a scalar as a zero-dimensional tensor.
    pub fn insert_scalar(&mut self, name: impl Into<String>, value: f32) {
        self.tensors.insert(
            name.into(),
            NamedTensor {
                shape: Vec::new(),
                data: vec![value],
            },
        );
    }

    fn lookup(&self, name: &str, shape: &[usize]) -> NnResult<&NamedTensor> {
        let tensor = self
            .tensors
            .get(name)
            .ok_or_else(|| NnError::MissingTensor(name.to_string()))?;
        let count: usize = shape.iter().product();
        if tensor.shape != shape || tensor.data.len() != count {
            return Err(NnError::CheckpointMismatch {
                name: name.to_string(),
                expected: shape.to_vec(),
                actual: tensor.shape.clone(),
            });
        }
        Ok(tensor)
    }

    /// Reads a matrix of the given shape.
    pub fn matrix(&self, name: &str, rows: usize, cols: usize) -> NnResult<Array2<f32>> {
        let tensor = self.lookup(name, &[rows, cols])?;
        Array2::from_shape_vec((rows, cols), tensor.data.clone()).map_err(|_| {
            NnError::CheckpointMismatch {
                name: name.to_string(),
                expected: vec![rows, cols],
                actual: tensor.shape.clone(),
            }
        })
    }

    /// Reads a vector of the given length.
    pub fn vector(&self, name: &str, len: usize) -> NnResult<Array1<f32>> {
        let tensor = self.lookup(name, &[len])?;
        Ok(Array1::from_vec(tensor.data.clone()))
    }

    /// Reads a scalar.
    pub fn scalar(&self, name: &str) -> NnResult<f32> {
        let tensor = self.lookup(name, &[])?;
        Ok(tensor.data[0])
    }

    /// Writes the checkpoint as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> NnResult<()> {
        let text = serde_json::to_string(self)?;
        std::fs::write(path.as_ref(), text)?;
        log::info!(
            "saved checkpoint with {} tensors to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Reads a checkpoint from JSON.
    pub fn load(path: impl AsRef<Path>) -> NnResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let checkpoint: Self = serde_json::from_str(&text)?;
        log::info!(
            "loaded checkpoint with {} tensors from {}",
            checkpoint.len(),
            path.as_ref().display()
        );
        Ok(checkpoint)
    }
}

/// Types whose learned parameters can be written to and read from a checkpoint.
pub trait Parameters {
    /// Stores every parameter under `prefix`.
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint);

    /// Replaces every parameter with the one stored under `prefix`.
    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()>;
}

/// Joins a prefix and a child name with a dot.
pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
