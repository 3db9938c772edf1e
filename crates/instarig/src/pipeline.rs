//! End-to-end joint prediction.

use glam::Vec3;

use instarig_cluster::{cluster, ClusterDiagnostic, Joint};
use instarig_core::{preprocess, Bandwidth, Mesh, NormalizeTransform, RigOptions};
use instarig_nn::ModelParams;

use crate::Result;

/// Everything produced for one mesh.
///
/// Points and joints are in the input mesh's coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Vertex positions plus predicted displacements.
    pub displaced: Vec<Vec3>,
    /// Per-vertex attention in `[0, 1]`.
    pub attention: Vec<f32>,
    /// Clustering state after the last mean-shift iteration.
    pub converged: Vec<Vec3>,
    /// Extracted joints, in cluster creation order.
    pub joints: Vec<Joint>,
    /// Bandwidth the kernel used (after clamping), in the space clustering ran in.
    pub bandwidth: f32,
    pub diagnostics: Vec<ClusterDiagnostic>,
}

/// Network outputs in the space the network ran in.
pub(crate) struct Inference {
    pub displaced: Vec<Vec3>,
    pub attention: Vec<f32>,
    pub transform: Option<NormalizeTransform>,
}

impl Inference {
    pub fn to_mesh_space(&self, p: Vec3) -> Vec3 {
        match &self.transform {
            Some(t) => t.to_mesh_space(p),
            None => p,
        }
    }

    pub fn to_model_space(&self, p: Vec3) -> Vec3 {
        match &self.transform {
            Some(t) => t.to_normalized(p),
            None => p,
        }
    }
}

/// Runs preprocessing and the network, normalizing the mesh first if asked.
pub(crate) fn infer(mesh: &Mesh, params: &ModelParams, options: &RigOptions) -> Result<Inference> {
    options.validate()?;

    let (input, transform) = if options.preprocess.normalize {
        let (normalized, transform) = mesh.normalized();
        (Some(normalized), Some(transform))
    } else {
        (None, None)
    };
    let input = input.as_ref().unwrap_or(mesh);

    let graph = preprocess(input, &options.preprocess)?;
    let output = params.forward(&graph)?;

    Ok(Inference {
        displaced: output.displaced,
        attention: output.attention,
        transform,
    })
}

/// Predicts joints for a mesh with the model's learned bandwidth.
pub fn predict_joints(mesh: &Mesh, params: &ModelParams, options: &RigOptions) -> Result<Prediction> {
    predict_with_bandwidth(mesh, params, params.bandwidth, options)
}

/// Predicts joints with an explicit bandwidth in place of the learned one.
pub fn predict_with_bandwidth(
    mesh: &Mesh,
    params: &ModelParams,
    bandwidth: Bandwidth,
    options: &RigOptions,
) -> Result<Prediction> {
    let inference = infer(mesh, params, options)?;
    let report = cluster(
        &inference.displaced,
        &inference.attention,
        bandwidth,
        &options.cluster,
    )?;

    let back = |points: &[Vec3]| -> Vec<Vec3> {
        points.iter().map(|&p| inference.to_mesh_space(p)).collect()
    };
    let displaced = back(&inference.displaced);
    let converged = back(&report.converged);
    let joints = report
        .joints
        .iter()
        .map(|j| Joint {
            position: inference.to_mesh_space(j.position),
            ..*j
        })
        .collect();

    log::info!(
        "predicted {} joints for a mesh with {} vertices",
        report.joints.len(),
        mesh.num_vertices()
    );

    Ok(Prediction {
        displaced,
        attention: inference.attention,
        converged,
        joints,
        bandwidth: report.bandwidth,
        diagnostics: report.diagnostics,
    })
}
