//! Mesh preprocessing: turns a [`Mesh`] into a [`GraphRecord`].
//!
//! Two vertex graphs are derived from the mesh:
//! - the mesh-adjacency graph, connecting vertices that share a face edge
//! - the geodesic graph, connecting vertices whose shortest-path distance over
//!   the mesh edges lies within the geodesic radius (see [`geodesic_radius`])
//!
//! Both are stored as sorted, deduplicated unordered pairs `(a, b)` with
//! `a < b`. Self-loops never appear in either list.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use ndarray::Array2;

use crate::error::Result;
use crate::mesh::{self, Mesh};
use crate::options::PreprocessOptions;

/// Vertex features plus the two edge sets consumed by the network.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRecord {
    /// Vertex feature matrix, one row per vertex (initially `x, y, z`).
    pub features: Array2<f32>,

    /// Unordered mesh-adjacency pairs.
    pub mesh_edges: Vec<(u32, u32)>,

    /// Unordered geodesic-neighbor pairs.
    pub geodesic_edges: Vec<(u32, u32)>,
}

impl GraphRecord {
    /// Returns the number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.features.nrows()
    }
}

/// Builds the graph record for a mesh.
pub fn preprocess(mesh: &Mesh, options: &PreprocessOptions) -> Result<GraphRecord> {
    mesh::validate(mesh.vertices(), mesh.faces())?;
    options.validate()?;

    let n = mesh.num_vertices();
    let mut features = Array2::<f32>::zeros((n, 3));
    for (mut row, v) in features.rows_mut().into_iter().zip(mesh.vertices()) {
        row[0] = v.x;
        row[1] = v.y;
        row[2] = v.z;
    }

    let mesh_edges = mesh_edges(mesh.faces());
    let geodesic_edges = geodesic_edges(mesh, &mesh_edges, options);

    log::debug!(
        "preprocessed mesh: {} vertices, {} mesh edges, {} geodesic edges",
        n,
        mesh_edges.len(),
        geodesic_edges.len()
    );
    if !mesh_edges.is_empty() && geodesic_edges.is_empty() {
        log::warn!(
            "geodesic graph is empty: radius {} is shorter than every mesh edge",
            geodesic_radius(mesh, &mesh_edges, options)
        );
    }

    Ok(GraphRecord {
        features,
        mesh_edges,
        geodesic_edges,
    })
}

/// Computes the unique face edges as sorted pairs, dropping degenerate ones.
pub fn mesh_edges(faces: &[[u32; 3]]) -> Vec<(u32, u32)> {
    let mut edge_set = BTreeSet::new();

    for &[a, b, c] in faces {
        for (v0, v1) in [(a, b), (b, c), (a, c)] {
            if v0 == v1 {
                continue;
            }
            edge_set.insert(if v0 < v1 { (v0, v1) } else { (v1, v0) });
        }
    }

    edge_set.into_iter().collect()
}

/// Expands unordered pairs into `(source, target)` message directions.
pub fn directed(edges: &[(u32, u32)]) -> Vec<(usize, usize)> {
    edges
        .iter()
        .flat_map(|&(a, b)| [(a as usize, b as usize), (b as usize, a as usize)])
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    vertex: usize,
    dist: f32,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

// Min-heap on distance, then on vertex index.
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns the search radius used for geodesic neighbors.
///
/// This is [`PreprocessOptions::geodesic_radius`], raised to
/// [`PreprocessOptions::min_radius_edge_lengths`] times the mean mesh-edge
/// length so coarse meshes still reach past their one-ring.
pub fn geodesic_radius(mesh: &Mesh, mesh_edges: &[(u32, u32)], options: &PreprocessOptions) -> f32 {
    if mesh_edges.is_empty() || options.min_radius_edge_lengths <= 0.0 {
        return options.geodesic_radius;
    }
    let vertices = mesh.vertices();
    let total: f32 = mesh_edges
        .iter()
        .map(|&(a, b)| vertices[a as usize].distance(vertices[b as usize]))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = total / mesh_edges.len() as f32;
    options
        .geodesic_radius
        .max(options.min_radius_edge_lengths * mean)
}

/// Computes geodesic-neighbor pairs with a radius-bounded Dijkstra from every
/// vertex over the mesh-edge graph, weighted by Euclidean edge length.
pub fn geodesic_edges(
    mesh: &Mesh,
    mesh_edges: &[(u32, u32)],
    options: &PreprocessOptions,
) -> Vec<(u32, u32)> {
    let vertices = mesh.vertices();
    let n = vertices.len();

    let mut adjacency: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n];
    for &(a, b) in mesh_edges {
        let (a, b) = (a as usize, b as usize);
        let len = vertices[a].distance(vertices[b]);
        adjacency[a].push((b, len));
        adjacency[b].push((a, len));
    }

    let radius = geodesic_radius(mesh, mesh_edges, options);
    let mut dist = vec![f32::INFINITY; n];
    let mut touched: Vec<usize> = Vec::new();
    let mut heap = BinaryHeap::new();
    let mut edge_set = BTreeSet::new();

    for source in 0..n {
        dist[source] = 0.0;
        touched.push(source);
        heap.push(Frontier {
            vertex: source,
            dist: 0.0,
        });

        let mut reached: Vec<(f32, usize)> = Vec::new();
        while let Some(Frontier { vertex, dist: d }) = heap.pop() {
            if d > dist[vertex] {
                continue;
            }
            if vertex != source {
                reached.push((d, vertex));
            }
            for &(next, len) in &adjacency[vertex] {
                let candidate = d + len;
                if candidate <= radius && candidate < dist[next] {
                    if dist[next].is_infinite() {
                        touched.push(next);
                    }
                    dist[next] = candidate;
                    heap.push(Frontier {
                        vertex: next,
                        dist: candidate,
                    });
                }
            }
        }

        if let Some(cap) = options.max_geodesic_neighbors {
            reached.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            reached.truncate(cap);
        }

        for (_, other) in reached {
            #[allow(clippy::cast_possible_truncation)]
            let (a, b) = (source as u32, other as u32);
            edge_set.insert(if a < b { (a, b) } else { (b, a) });
        }

        for v in touched.drain(..) {
            dist[v] = f32::INFINITY;
        }
    }

    edge_set.into_iter().collect()
}
