//! End-to-end prediction tests.
//!
//! The network is made deterministic by zeroing the displacement head and
//! saturating the attention head, so the joints depend only on mesh geometry
//! and the bandwidth.

use instarig::*;

fn small_config() -> NetworkConfig {
    NetworkConfig {
        in_dim: 3,
        hidden_dim: 8,
        out_dim: 12,
        head_hidden_dim: 6,
    }
}

/// Parameters with zero displacement and attention ≈ 1 everywhere.
fn controlled_params(bandwidth: f32) -> ModelParams {
    let mut params = ModelParams::init(small_config(), 42).unwrap();
    params.displacement.mlp.fc2.weight.fill(0.0);
    params.displacement.mlp.fc2.bias.fill(0.0);
    params.attention.mlp.fc2.weight.fill(0.0);
    params.attention.mlp.fc2.bias.fill(10.0);
    params.bandwidth = Bandwidth::new(bandwidth);
    params
}

fn cube(scale: f32, offset: Vec3) -> Mesh {
    let mut vertices = Vec::new();
    for x in [0.0, 1.0] {
        for y in [0.0, 1.0] {
            for z in [0.0, 1.0] {
                vertices.push(Vec3::new(x, y, z) * scale + offset);
            }
        }
    }
    let faces = vec![
        [0, 1, 3], [0, 3, 2], // x = 0
        [4, 6, 7], [4, 7, 5], // x = 1
        [0, 4, 5], [0, 5, 1], // y = 0
        [2, 3, 7], [2, 7, 6], // y = 1
        [0, 2, 6], [0, 6, 4], // z = 0
        [1, 5, 7], [1, 7, 3], // z = 1
    ];
    Mesh::new(vertices, faces).unwrap()
}

fn octahedron(center: Vec3, radius: f32, first: u32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let vertices = vec![
        center + Vec3::X * radius,
        center - Vec3::X * radius,
        center + Vec3::Y * radius,
        center - Vec3::Y * radius,
        center + Vec3::Z * radius,
        center - Vec3::Z * radius,
    ];
    let f = |a: u32, b: u32, c: u32| [first + a, first + b, first + c];
    let faces = vec![
        f(0, 2, 4), f(2, 1, 4), f(1, 3, 4), f(3, 0, 4),
        f(2, 0, 5), f(1, 2, 5), f(3, 1, 5), f(0, 3, 5),
    ];
    (vertices, faces)
}

#[test]
fn test_cube_single_joint_at_centroid() {
    let params = controlled_params(2.0);
    let prediction = predict_joints(&cube(1.0, Vec3::ZERO), &params, &RigOptions::default()).unwrap();

    assert_eq!(prediction.displaced.len(), 8);
    assert!(prediction.attention.iter().all(|a| *a > 0.99));
    assert_eq!(prediction.joints.len(), 1);
    assert!(prediction.joints[0].position.distance(Vec3::splat(0.5)) < 1e-3);
    assert!(prediction.diagnostics.is_empty());
}

#[test]
fn test_two_separated_clusters() {
    let far = Vec3::new(10.0, 0.0, 0.0);
    let (mut vertices, mut faces) = octahedron(Vec3::ZERO, 0.2, 0);
    let (v2, f2) = octahedron(far, 0.2, 6);
    vertices.extend(v2);
    faces.extend(f2);
    let mesh = Mesh::new(vertices, faces).unwrap();

    let prediction = predict_joints(&mesh, &controlled_params(1.0), &RigOptions::default()).unwrap();
    assert_eq!(prediction.joints.len(), 2);

    let mut positions: Vec<Vec3> = prediction.joints.iter().map(|j| j.position).collect();
    positions.sort_by(|a, b| a.x.total_cmp(&b.x));
    assert!(positions[0].distance(Vec3::ZERO) < 0.05);
    assert!(positions[1].distance(far) < 0.05);
}

#[test]
fn test_degenerate_bandwidth_is_a_diagnostic() {
    let params = controlled_params(0.0);
    let prediction = predict_joints(&cube(1.0, Vec3::ZERO), &params, &RigOptions::default()).unwrap();
    assert_eq!(prediction.joints.len(), 8);
    assert_eq!(prediction.bandwidth, MIN_BANDWIDTH);
    assert!(matches!(
        prediction.diagnostics[0],
        ClusterDiagnostic::BandwidthClamped { .. }
    ));
}

#[test]
fn test_normalized_prediction_maps_back() {
    let center = Vec3::new(100.0, -50.0, 25.0);
    let mesh = cube(40.0, center - Vec3::splat(20.0));
    let mut options = RigOptions::default();
    options.preprocess.normalize = true;

    // Bandwidth 2 in normalized units covers the whole unit cube.
    let prediction = predict_joints(&mesh, &controlled_params(2.0), &options).unwrap();
    assert_eq!(prediction.joints.len(), 1);
    assert!(prediction.joints[0].position.distance(center) < 0.1);
    for (p, v) in prediction.displaced.iter().zip(mesh.vertices()) {
        assert!(p.distance(*v) < 1e-3);
    }
}

#[test]
fn test_default_options_build_geodesic_graph() {
    let options = RigOptions::default();
    for scale in [0.5, 1.0, 40.0] {
        let mesh = cube(scale, Vec3::ZERO);
        let graph = preprocess(&mesh, &options.preprocess).unwrap();
        assert_eq!(graph.mesh_edges.len(), 18);
        assert!(!graph.geodesic_edges.is_empty(), "empty geodesic graph at scale {scale}");
        // Vertices 1 and 2 share no face edge but are two cube edges apart.
        assert!(!graph.mesh_edges.contains(&(1, 2)));
        assert!(graph.geodesic_edges.contains(&(1, 2)));
        assert_ne!(graph.geodesic_edges, graph.mesh_edges);
    }
}

#[test]
fn test_invalid_options_rejected() {
    let mut options = RigOptions::default();
    options.preprocess.geodesic_radius = f32::NAN;
    let result = predict_joints(&cube(1.0, Vec3::ZERO), &controlled_params(1.0), &options);
    assert!(matches!(result, Err(Error::Core(RigError::InvalidOption(_)))));
}

#[test]
fn test_checkpoint_file_roundtrip() {
    let mut params = ModelParams::init(small_config(), 7).unwrap();
    params.bandwidth = Bandwidth::new(0.75);
    let path = std::env::temp_dir().join(format!("instarig-pipeline-{}.json", std::process::id()));
    params.save(&path).unwrap();
    let loaded = ModelParams::load(small_config(), &path).unwrap();
    let _ = std::fs::remove_file(&path);

    let mesh = cube(1.0, Vec3::ZERO);
    let options = RigOptions::default();
    let a = predict_joints(&mesh, &params, &options).unwrap();
    let b = predict_joints(&mesh, &loaded, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_checkpoint_shape_mismatch_rejected() {
    let params = ModelParams::init(small_config(), 7).unwrap();
    let wider = NetworkConfig {
        out_dim: 16,
        ..small_config()
    };
    let result = ModelParams::from_checkpoint(wider, &params.to_checkpoint());
    assert!(matches!(result, Err(NnError::CheckpointMismatch { .. })));
}

#[test]
fn test_concurrent_predictions_share_params() {
    let params = controlled_params(2.0);
    let options = RigOptions::default();
    let meshes = [cube(1.0, Vec3::ZERO), cube(1.0, Vec3::new(5.0, 0.0, 0.0))];

    let (params, options) = (&params, &options);
    let joints: Vec<Vec<Joint>> = std::thread::scope(|scope| {
        let handles: Vec<_> = meshes
            .iter()
            .map(|mesh| scope.spawn(move || predict_joints(mesh, params, options).unwrap().joints))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(joints[0][0].position.distance(Vec3::splat(0.5)) < 1e-3);
    assert!(joints[1][0].position.distance(Vec3::new(5.5, 0.5, 0.5)) < 1e-3);
}
