//! The complete parameter bundle and the network forward pass.

use std::path::Path;

use glam::Vec3;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use instarig_core::{Bandwidth, GraphRecord, NetworkConfig};

use crate::backbone::Backbone;
use crate::checkpoint::{join, Checkpoint, Parameters};
use crate::error::{NnError, NnResult};
use crate::heads::{AttentionHead, DisplacementHead};

/// Per-vertex outputs of one forward pass.
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// Backbone features, one row per vertex.
    pub features: Array2<f32>,
    /// Predicted offsets, one per vertex.
    pub displacements: Vec<Vec3>,
    /// Vertex positions plus displacements.
    pub displaced: Vec<Vec3>,
    /// Clustering weights in `[0, 1]`, one per vertex.
    pub attention: Vec<f32>,
}

/// All learned state of the joint-prediction model.
///
/// Forward passes borrow the bundle immutably, so one instance can serve any
/// number of concurrent inferences. Only an explicit training step mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    config: NetworkConfig,
    pub backbone: Backbone,
    pub displacement: DisplacementHead,
    pub attention: AttentionHead,
    pub bandwidth: Bandwidth,
}

impl ModelParams {
    /// Creates freshly initialized parameters from a seed.
    pub fn init(config: NetworkConfig, seed: u64) -> NnResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let backbone = Backbone::init(&mut rng, &config);
        let displacement = DisplacementHead::init(&mut rng, config.out_dim, config.head_hidden_dim);
        let attention = AttentionHead::init(&mut rng, config.out_dim, config.head_hidden_dim);

        log::debug!("initialized model parameters (seed {seed}, {config:?})");
        Ok(Self {
            config,
            backbone,
            displacement,
            attention,
            bandwidth: Bandwidth::default(),
        })
    }

    /// Returns the layer widths.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Runs the backbone and both heads on a graph record.
    pub fn forward(&self, graph: &GraphRecord) -> NnResult<NetworkOutput> {
        // The first three feature columns are the vertex positions.
        if graph.features.ncols() != self.config.in_dim || graph.features.ncols() < 3 {
            return Err(NnError::ShapeMismatch {
                context: "graph features".into(),
                expected: vec![graph.num_vertices(), self.config.in_dim],
                actual: vec![graph.features.nrows(), graph.features.ncols()],
            });
        }

        let features = self.backbone.forward(graph)?;
        let displacements = self.displacement.forward(features.view())?;
        let attention = self.attention.forward(features.view())?;

        let displaced = graph
            .features
            .rows()
            .into_iter()
            .zip(&displacements)
            .map(|(row, d)| Vec3::new(row[0], row[1], row[2]) + *d)
            .collect();

        Ok(NetworkOutput {
            features,
            displacements,
            displaced,
            attention,
        })
    }

    /// Captures every parameter, including the bandwidth.
    pub fn to_checkpoint(&self) -> Checkpoint {
        let mut checkpoint = Checkpoint::new();
        self.save_into("", &mut checkpoint);
        checkpoint
    }

    /// Builds parameters of the given widths from a checkpoint.
    pub fn from_checkpoint(config: NetworkConfig, checkpoint: &Checkpoint) -> NnResult<Self> {
        let mut params = Self::init(config, 0)?;
        params.load_from("", checkpoint)?;
        Ok(params)
    }

    /// Writes the parameters to a JSON checkpoint.
    pub fn save(&self, path: impl AsRef<Path>) -> NnResult<()> {
        self.to_checkpoint().save(path)
    }

    /// Reads parameters of the given widths from a JSON checkpoint.
    pub fn load(config: NetworkConfig, path: impl AsRef<Path>) -> NnResult<Self> {
        Self::from_checkpoint(config, &Checkpoint::load(path)?)
    }
}

impl Parameters for ModelParams {
    fn save_into(&self, prefix: &str, checkpoint: &mut Checkpoint) {
        self.backbone.save_into(&join(prefix, "backbone"), checkpoint);
        self.displacement
            .save_into(&join(prefix, "displacement"), checkpoint);
        self.attention.save_into(&join(prefix, "attention"), checkpoint);
        checkpoint.insert_scalar(join(prefix, "bandwidth"), self.bandwidth.value());
    }

    fn load_from(&mut self, prefix: &str, checkpoint: &Checkpoint) -> NnResult<()> {
        self.backbone.load_from(&join(prefix, "backbone"), checkpoint)?;
        self.displacement
            .load_from(&join(prefix, "displacement"), checkpoint)?;
        self.attention.load_from(&join(prefix, "attention"), checkpoint)?;
        self.bandwidth = Bandwidth::new(checkpoint.scalar(&join(prefix, "bandwidth"))?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instarig_core::{preprocess, Mesh, PreprocessOptions};

    fn small_config() -> NetworkConfig {
        NetworkConfig {
            in_dim: 3,
            hidden_dim: 6,
            out_dim: 10,
            head_hidden_dim: 5,
        }
    }

    fn quad() -> Mesh {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        Mesh::new(vertices, vec![[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_init_is_deterministic() {
        let a = ModelParams::init(small_config(), 11).unwrap();
        let b = ModelParams::init(small_config(), 11).unwrap();
        let c = ModelParams::init(small_config(), 12).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.bandwidth, Bandwidth::new(Bandwidth::INITIAL));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NetworkConfig {
            out_dim: 0,
            ..small_config()
        };
        assert!(matches!(
            ModelParams::init(config, 0),
            Err(NnError::Core(_))
        ));
    }

    #[test]
    fn test_forward_outputs() {
        let params = ModelParams::init(small_config(), 3).unwrap();
        let graph = preprocess(&quad(), &PreprocessOptions::default()).unwrap();
        let out = params.forward(&graph).unwrap();

        assert_eq!(out.features.dim(), (4, 10));
        assert_eq!(out.displacements.len(), 4);
        assert_eq!(out.attention.len(), 4);
        for ((p, d), v) in out.displaced.iter().zip(&out.displacements).zip(quad().vertices()) {
            assert!((*p - (*v + *d)).length() < 1e-6);
        }
        assert!(out.attention.iter().all(|a| (0.0..=1.0).contains(a)));
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let mut params = ModelParams::init(small_config(), 5).unwrap();
        params.bandwidth = Bandwidth::new(0.125);
        let checkpoint = params.to_checkpoint();

        let restored = ModelParams::from_checkpoint(small_config(), &checkpoint).unwrap();
        assert_eq!(restored, params);

        let graph = preprocess(&quad(), &PreprocessOptions::default()).unwrap();
        let a = params.forward(&graph).unwrap();
        let b = restored.forward(&graph).unwrap();
        assert_eq!(a.displaced, b.displaced);
        assert_eq!(a.attention, b.attention);
    }

    #[test]
    fn test_checkpoint_names() {
        let params = ModelParams::init(small_config(), 5).unwrap();
        let checkpoint = params.to_checkpoint();
        let names: Vec<&str> = checkpoint.names().collect();
        assert!(names.contains(&"backbone.conv1.mesh.fc1.weight"));
        assert!(names.contains(&"backbone.conv3.geodesic.fc2.bias"));
        assert!(names.contains(&"attention.fc2.weight"));
        assert!(names.contains(&"bandwidth"));
    }

    #[test]
    fn test_checkpoint_width_mismatch_rejected() {
        let params = ModelParams::init(small_config(), 5).unwrap();
        let checkpoint = params.to_checkpoint();
        let wider = NetworkConfig {
            hidden_dim: 7,
            ..small_config()
        };
        assert!(matches!(
            ModelParams::from_checkpoint(wider, &checkpoint),
            Err(NnError::CheckpointMismatch { .. })
        ));
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("instarig-model-{}.json", std::process::id()));
        let params = ModelParams::init(small_config(), 9).unwrap();
        params.save(&path).unwrap();
        let loaded = ModelParams::load(small_config(), &path).unwrap();
        assert_eq!(loaded, params);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_params_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelParams>();
    }
}
