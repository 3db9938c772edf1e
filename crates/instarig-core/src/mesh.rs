//! Triangle meshes, the input to the rigging pipeline.

use glam::{UVec3, Vec3};

use crate::error::{Result, RigError};

/// An immutable triangle mesh.
///
/// Vertex positions and faces are validated on construction: the mesh has at
/// least one vertex and every face index refers to an existing vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates a mesh from vertex positions and triangle faces.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Result<Self> {
        validate(&vertices, &faces)?;
        Ok(Self { vertices, faces })
    }

    /// Creates a mesh from `UVec3` triangles.
    pub fn from_triangles(vertices: Vec<Vec3>, faces: &[UVec3]) -> Result<Self> {
        let faces = faces.iter().map(|f| [f.x, f.y, f.z]).collect();
        Self::new(vertices, faces)
    }

    /// Returns the number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Returns the vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Returns the triangle faces.
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Returns the axis-aligned bounding box `(min, max)`.
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &v in &self.vertices {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    /// Returns the length of the bounding-box diagonal.
    pub fn length_scale(&self) -> f32 {
        let (min, max) = self.bounding_box();
        (max - min).length()
    }

    /// Returns the vertex centroid.
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Vec3 {
        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32
    }

    /// Returns a copy centred on the bounding-box centre with its longest side
    /// scaled to 1, along with the transform that maps back to mesh space.
    pub fn normalized(&self) -> (Mesh, NormalizeTransform) {
        let (min, max) = self.bounding_box();
        let center = (min + max) * 0.5;
        let extent = (max - min).max_element();
        let scale = if extent > f32::EPSILON { extent } else { 1.0 };

        let vertices = self
            .vertices
            .iter()
            .map(|&v| (v - center) / scale)
            .collect();
        let mesh = Mesh {
            vertices,
            faces: self.faces.clone(),
        };
        (mesh, NormalizeTransform { center, scale })
    }
}

/// Maps points between normalized space and the original mesh space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeTransform {
    /// Bounding-box centre of the original mesh.
    pub center: Vec3,
    /// Longest bounding-box side of the original mesh.
    pub scale: f32,
}

impl NormalizeTransform {
    /// Maps a point from normalized space back to mesh space.
    pub fn to_mesh_space(&self, p: Vec3) -> Vec3 {
        p * self.scale + self.center
    }

    /// Maps a point from mesh space into normalized space.
    pub fn to_normalized(&self, p: Vec3) -> Vec3 {
        (p - self.center) / self.scale
    }
}

pub(crate) fn validate(vertices: &[Vec3], faces: &[[u32; 3]]) -> Result<()> {
    if vertices.is_empty() {
        return Err(RigError::InvalidMesh("mesh has no vertices".into()));
    }
    let n = vertices.len();
    for (fi, face) in faces.iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&i| i as usize >= n) {
            return Err(RigError::InvalidMesh(format!(
                "face {fi} references vertex {bad}, but the mesh has {n} vertices"
            )));
        }
    }
    if let Some(i) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(RigError::InvalidMesh(format!(
            "vertex {i} has a non-finite position"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
        ];
        let mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = Mesh::new(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, RigError::InvalidMesh(_)));
    }

    #[test]
    fn test_out_of_range_face_rejected() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let err = Mesh::new(vertices, vec![[0, 1, 3]]).unwrap_err();
        assert!(matches!(err, RigError::InvalidMesh(_)));
    }

    #[test]
    fn test_non_finite_vertex_rejected() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::new(f32::NAN, 0.0, 0.0)];
        assert!(Mesh::new(vertices, vec![[0, 1, 2]]).is_err());
    }

    #[test]
    fn test_vertices_without_faces_allowed() {
        let mesh = Mesh::new(vec![Vec3::ZERO], Vec::new()).unwrap();
        assert_eq!(mesh.num_vertices(), 1);
    }

    #[test]
    fn test_from_triangles() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let mesh = Mesh::from_triangles(vertices, &[UVec3::new(0, 1, 2)]).unwrap();
        assert_eq!(mesh.faces(), &[[0, 1, 2]]);
    }

    #[test]
    fn test_normalized_roundtrip() {
        let vertices = vec![
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 1.0),
        ];
        let mesh = Mesh::new(vertices.clone(), vec![[0, 1, 2]]).unwrap();
        let (normalized, transform) = mesh.normalized();

        let (min, max) = normalized.bounding_box();
        assert!(((max - min).max_element() - 1.0).abs() < 1e-6);
        assert!(((min + max) * 0.5).length() < 1e-6);

        for (n, &orig) in normalized.vertices().iter().zip(&vertices) {
            assert!((transform.to_mesh_space(*n) - orig).length() < 1e-5);
        }
    }

    #[test]
    fn test_length_scale() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::ONE], Vec::new()).unwrap();
        assert!((mesh.length_scale() - 3.0_f32.sqrt()).abs() < 1e-6);
    }
}
