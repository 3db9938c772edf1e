//! Backbone network: three edge convolutions plus whole-mesh context.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use instarig_core::{directed, GraphRecord, NetworkConfig};

use crate::checkpoint::{join, Checkpoint, Parameters};
use crate::edge_conv::EdgeConv;
use crate::error::{NnError, NnResult};
use crate::layers::{hstack, Mlp};

/// Shared feature extractor for the displacement and attention heads.
#[derive(Debug, Clone, PartialEq)]
pub struct Backbone {
    pub conv1: EdgeConv,
    pub conv2: EdgeConv,
    pub conv3: EdgeConv,
    /// Projects `[x1, x2, x3, global]` to the backbone width.
    pub head: Mlp,
}

impl Backbone {
    /// Creates a backbone with the widths in `config`.
    pub fn init<R: Rng>(rng: &mut R, config: &NetworkConfig) -> Self {
        let hidden = config.hidden_dim;
        Self {
            conv1: EdgeConv::init(rng, config.in_dim, hidden),
            conv2: EdgeConv::init(rng, hidden, hidden),
            conv3: EdgeConv::init(rng, hidden, hidden),
            head: Mlp::init(rng, 6 * hidden, config.out_dim, config.out_dim),
        }
    }

    /// Returns the width of the produced features.
    pub fn out_dim(&self) -> usize {
        self.head.out_dim()
    }

    /// Computes one feature row per vertex of `graph`, in vertex order.
    pub fn forward(&self, graph: &GraphRecord) -> NnResult<Array2<f32>> {
        let mesh_edges = directed(&graph.mesh_edges);
        let geodesic_edges = directed(&graph.geodesic_edges);
        self.forward_features(graph.features.view(), &mesh_edges, &geodesic_edges)
    }

    /// Same as [`Backbone::forward`] on already expanded edge lists.
    pub fn forward_features(
        &self,
        x: ArrayView2<'_, f32>,
        mesh_edges: &[(usize, usize)],
        geodesic_edges: &[(usize, usize)],
    ) -> NnResult<Array2<f32>> {
        let n = x.nrows();
        if n == 0 {
            return Err(NnError::ShapeMismatch {
                context: "backbone input has no vertices".into(),
                expected: vec![1, x.ncols()],
                actual: vec![0, x.ncols()],
            });
        }

        let x1 = self.conv1.forward(x, mesh_edges, geodesic_edges)?;
        let x2 = self.conv2.forward(x1.view(), mesh_edges, geodesic_edges)?;
        let x3 = self.conv3.forward(x2.view(), mesh_edges, geodesic_edges)?;

        let global = hstack(&[
            column_max(&x1).insert_axis(Axis(0)).view(),
            column_max(&x2).insert_axis(Axis(0)).view(),
            column_max(&x3).insert_axis(Axis(0)).view(),
        ])?;
        let global = global.row(0);
        let broadcast = Array2::from_shape_fn((n, global.len()), |(_, c)| global[c]);

        let stacked = hstack(&[x1.view(), x2.view(), x3.view(), broadcast.view()])?;
        let features = self.head.forward(stacked.view())?;

        log::debug!("backbone: {} vertices -> {:?}", n, features.dim());
        Ok(features)
    }
}

impl Parameters for Backbone {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        self.conv1.save_into(&join(prefix, "conv1"), checkpoint);
        self.conv2.save_into(&join(prefix, "conv2"), checkpoint);
        self.conv3.save_into(&join(prefix, "conv3"), checkpoint);
        self.head.save_into(&join(prefix, "head"), checkpoint);
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        self.conv1.load_from(&join(prefix, "conv1"), checkpoint)?;
        self.conv2.load_from(&join(prefix, "conv2"), checkpoint)?;
        self.conv3.load_from(&join(prefix, "conv3"), checkpoint)?;
        self.head.load_from(&join(prefix, "head"), checkpoint)
    }
}

/// Per-channel maximum over all rows.
fn column_max(x: &Array2<f32>) -> Array1<f32> {
    x.fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &v| acc.max(v))
}
