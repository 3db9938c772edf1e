//! Host-facing skeleton generation over named meshes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use instarig_cluster::ClusterDiagnostic;
use instarig_core::{Mesh, Registry, RigOptions};
use instarig_nn::ModelParams;

use crate::pipeline::predict_with_bandwidth;
use crate::Result;

/// Opaque reference to a mesh registered with a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    name: String,
}

impl MeshHandle {
    /// Creates a handle for a mesh name known to the host.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the mesh name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Mirror axis requested by the host.
///
/// Accepted and logged; joint positions are not symmetrized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetryAxis {
    #[default]
    None,
    X,
    Y,
    Z,
}

/// Coarseness of the generated skeleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailLevel {
    /// Wider kernel, fewer joints.
    Low,
    #[default]
    Medium,
    /// Narrower kernel and more iterations, more joints.
    High,
}

impl DetailLevel {
    /// Factor applied to the learned bandwidth.
    pub fn bandwidth_scale(self) -> f32 {
        match self {
            DetailLevel::Low => 2.0,
            DetailLevel::Medium => 1.0,
            DetailLevel::High => 0.5,
        }
    }

    /// Mean-shift iteration count.
    pub fn iterations(self) -> usize {
        match self {
            DetailLevel::Low | DetailLevel::Medium => 5,
            DetailLevel::High => 8,
        }
    }
}

/// A joint with its skeleton name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedJoint {
    pub name: String,
    pub position: Vec3,
    /// Summed attention of the joint's member vertices.
    pub weight: f32,
}

/// Output of [`Context::generate_skeleton`].
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    /// Named joints, root first.
    pub joints: Vec<NamedJoint>,
    /// Clamped-bandwidth and ambiguity reports from clustering.
    pub diagnostics: Vec<ClusterDiagnostic>,
}

impl Skeleton {
    /// Returns true when clustering reported nothing unusual.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Owns the meshes a host has registered and the options used to rig them.
#[derive(Debug, Default)]
pub struct Context {
    registry: Registry,
    options: RigOptions,
}

impl Context {
    /// Creates an empty context with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty context with the given options.
    pub fn with_options(options: RigOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            registry: Registry::new(),
            options,
        })
    }

    /// Returns the rigging options.
    pub fn options(&self) -> &RigOptions {
        &self.options
    }

    /// Registers a mesh under `name`; names must be unique.
    pub fn register_mesh(&mut self, name: impl Into<String>, mesh: Mesh) -> Result<MeshHandle> {
        let handle = MeshHandle::new(name);
        self.registry.register(handle.name.clone(), mesh)?;
        log::debug!("registered mesh '{}'", handle.name);
        Ok(handle)
    }

    /// Resolves a handle to its mesh.
    pub fn mesh(&self, handle: &MeshHandle) -> Result<&Mesh> {
        Ok(self.registry.resolve(&handle.name)?)
    }

    /// Removes a mesh, returning it if it was registered.
    pub fn remove_mesh(&mut self, handle: &MeshHandle) -> Option<Mesh> {
        self.registry.remove(&handle.name)
    }

    /// Returns the registered mesh names in sorted order.
    pub fn mesh_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Predicts a named skeleton for a registered mesh.
    ///
    /// The first joint is `RootJoint`, the one nearest the weighted centroid
    /// of all joints. The rest follow by ascending distance from the root as
    /// `Joint_01`, `Joint_02`, and so on. Clustering diagnostics are returned
    /// with the joints.
    pub fn generate_skeleton(
        &self,
        handle: &MeshHandle,
        params: &ModelParams,
        symmetry: SymmetryAxis,
        detail: DetailLevel,
    ) -> Result<Skeleton> {
        let mesh = self.mesh(handle)?;

        let mut options = self.options.clone();
        options.cluster.iterations = detail.iterations();
        let bandwidth = params.bandwidth.scaled(detail.bandwidth_scale());

        log::info!(
            "generating skeleton for '{}' (symmetry {:?}, detail {:?})",
            handle.name,
            symmetry,
            detail
        );
        let prediction = predict_with_bandwidth(mesh, params, bandwidth, &options)?;

        let joints: Vec<(Vec3, f32)> = prediction
            .joints
            .iter()
            .map(|j| (j.position, j.weight))
            .collect();
        Ok(Skeleton {
            joints: name_joints(&joints),
            diagnostics: prediction.diagnostics,
        })
    }
}

/// Orders joints from the root outward and names them.
pub fn name_joints(joints: &[(Vec3, f32)]) -> Vec<NamedJoint> {
    if joints.is_empty() {
        return Vec::new();
    }

    let total: f32 = joints.iter().map(|(_, w)| *w).sum();
    #[allow(clippy::cast_precision_loss)]
    let centroid = if total > 0.0 {
        joints.iter().map(|(p, w)| *p * *w).sum::<Vec3>() / total
    } else {
        joints.iter().map(|(p, _)| *p).sum::<Vec3>() / joints.len() as f32
    };

    let nearest_first = |target: Vec3| {
        let mut order: Vec<usize> = (0..joints.len()).collect();
        order.sort_by(|&a, &b| {
            joints[a]
                .0
                .distance_squared(target)
                .total_cmp(&joints[b].0.distance_squared(target))
                .then(a.cmp(&b))
        });
        order
    };

    let root = nearest_first(centroid)[0];
    let mut named = Vec::with_capacity(joints.len());
    named.push(NamedJoint {
        name: "RootJoint".to_string(),
        position: joints[root].0,
        weight: joints[root].1,
    });
    for (k, i) in nearest_first(joints[root].0)
        .into_iter()
        .filter(|&i| i != root)
        .enumerate()
    {
        named.push(NamedJoint {
            name: format!("Joint_{:02}", k + 1),
            position: joints[i].0,
            weight: joints[i].1,
        });
    }
    named
}
