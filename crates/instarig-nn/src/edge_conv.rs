//! Geometry-aware edge convolution.
//!
//! Each directed edge `j → i` produces a message `mlp([x_i, x_j - x_i])`.
//! Messages are max-reduced per target vertex, separately for the mesh graph
//! and the geodesic graph, and the two aggregates are fused by a third MLP.

use ndarray::{s, Array2, ArrayView2};
use rand::Rng;

use crate::checkpoint::{join, Checkpoint, Parameters};
use crate::error::{NnError, NnResult};
use crate::layers::{hstack, Mlp};

/// One edge-convolution layer over the mesh and geodesic graphs.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeConv {
    /// Message function for mesh-adjacency edges.
    pub mesh: Mlp,
    /// Message function for geodesic edges.
    pub geodesic: Mlp,
    /// Fuses the two aggregates.
    pub combine: Mlp,
}

impl EdgeConv {
    /// Creates a layer mapping `in_dim`-wide features to `out_dim`.
    pub fn init<R: Rng>(rng: &mut R, in_dim: usize, out_dim: usize) -> Self {
        Self {
            mesh: Mlp::init(rng, 2 * in_dim, out_dim, out_dim),
            geodesic: Mlp::init(rng, 2 * in_dim, out_dim, out_dim),
            combine: Mlp::init(rng, 2 * out_dim, out_dim, out_dim),
        }
    }

    /// Returns the output width.
    pub fn out_dim(&self) -> usize {
        self.combine.out_dim()
    }

    /// Applies the layer.
    ///
    /// Edges are `(source, target)` pairs; both directions of every undirected
    /// edge must be present (see [`instarig_core::directed`]).
    pub fn forward(
        &self,
        x: ArrayView2<'_, f32>,
        mesh_edges: &[(usize, usize)],
        geodesic_edges: &[(usize, usize)],
    ) -> NnResult<Array2<f32>> {
        let mesh_agg = propagate(&self.mesh, x, mesh_edges)?;
        let geo_agg = propagate(&self.geodesic, x, geodesic_edges)?;
        let fused = hstack(&[mesh_agg.view(), geo_agg.view()])?;
        self.combine.forward(fused.view())
    }
}

impl Parameters for EdgeConv {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        self.mesh.save_into(&join(prefix, "mesh"), checkpoint);
        self.geodesic.save_into(&join(prefix, "geodesic"), checkpoint);
        self.combine.save_into(&join(prefix, "combine"), checkpoint);
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        self.mesh.load_from(&join(prefix, "mesh"), checkpoint)?;
        self.geodesic.load_from(&join(prefix, "geodesic"), checkpoint)?;
        self.combine.load_from(&join(prefix, "combine"), checkpoint)
    }
}

/// Computes one message per edge and max-reduces them per target vertex.
fn propagate(
    mlp: &Mlp,
    x: ArrayView2<'_, f32>,
    edges: &[(usize, usize)],
) -> NnResult<Array2<f32>> {
    let (n, in_dim) = x.dim();
    if let Some(&(src, dst)) = edges.iter().find(|&&(a, b)| a >= n || b >= n) {
        return Err(NnError::ShapeMismatch {
            context: format!("edge ({src}, {dst}) outside the vertex range"),
            expected: vec![n],
            actual: vec![src.max(dst) + 1],
        });
    }

    let mut input = Array2::<f32>::zeros((edges.len(), 2 * in_dim));
    for (mut row, &(src, dst)) in input.rows_mut().into_iter().zip(edges) {
        let x_i = x.row(dst);
        let x_j = x.row(src);
        row.slice_mut(s![..in_dim]).assign(&x_i);
        row.slice_mut(s![in_dim..]).assign(&(&x_j - &x_i));
    }
    let messages = mlp.forward(input.view())?;

    Ok(max_aggregate(&messages, edges, n))
}

/// Per-channel maximum of incoming messages; vertices without messages get zeros.
pub fn max_aggregate(messages: &Array2<f32>, edges: &[(usize, usize)], n: usize) -> Array2<f32> {
    let width = messages.ncols();
    let mut out = Array2::from_elem((n, width), f32::NEG_INFINITY);
    let mut received = vec![false; n];

    for (message, &(_, dst)) in messages.rows().into_iter().zip(edges) {
        received[dst] = true;
        let mut row = out.row_mut(dst);
        row.zip_mut_with(&message, |acc, &m| *acc = acc.max(m));
    }

    for (mut row, got) in out.rows_mut().into_iter().zip(received) {
        if !got {
            row.fill(0.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Linear;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// An MLP whose output is `[x_i, x_j - x_i]` unchanged for non-negative input.
    fn identity_mlp(width: usize) -> Mlp {
        let eye = Array2::eye(width);
        Mlp {
            fc1: Linear {
                weight: eye.clone(),
                bias: ndarray::Array1::zeros(width),
            },
            fc2: Linear {
                weight: eye,
                bias: ndarray::Array1::zeros(width),
            },
        }
    }

    #[test]
    fn test_max_aggregate() {
        let messages = array![[1.0, 5.0], [3.0, 2.0], [7.0, 7.0]];
        let edges = [(1, 0), (2, 0), (0, 1)];
        let out = max_aggregate(&messages, &edges, 3);
        assert_eq!(out, array![[3.0, 5.0], [7.0, 7.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_messages_use_relative_features() {
        let x = array![[1.0], [4.0]];
        // Only 1 -> 0: message for vertex 0 is relu([x_0, x_1 - x_0]) = [1, 3]
        let out = propagate(&identity_mlp(2), x.view(), &[(1, 0)]).unwrap();
        assert_eq!(out, array![[1.0, 3.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_edge_out_of_range_rejected() {
        let x = array![[1.0], [4.0]];
        assert!(propagate(&identity_mlp(2), x.view(), &[(5, 0)]).is_err());
    }

    #[test]
    fn test_forward_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        let conv = EdgeConv::init(&mut rng, 3, 8);
        let x = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let edges = [(0, 1), (1, 0), (1, 2), (2, 1)];
        let geo = [(0, 2), (2, 0)];

        let y = conv.forward(x.view(), &edges, &geo).unwrap();
        assert_eq!(y.dim(), (3, 8));
        assert_eq!(conv.out_dim(), 8);
        assert!(y.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_edge_sets() {
        let mut rng = StdRng::seed_from_u64(4);
        let conv = EdgeConv::init(&mut rng, 3, 4);
        let x = Array2::<f32>::ones((5, 3));
        let y = conv.forward(x.view(), &[], &[]).unwrap();
        // Zero aggregates feed the combine MLP; every row is identical.
        assert_eq!(y.dim(), (5, 4));
        for row in y.rows() {
            assert_eq!(row, y.row(0));
        }
    }
}
