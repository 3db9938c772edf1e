//! Wavefront OBJ loading.

use std::path::Path;

use glam::Vec3;

use instarig_core::{Mesh, RigError};

use crate::Result;

/// Loads an OBJ file as a single triangle mesh.
///
/// Polygons are triangulated and all models in the file are merged.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let offset = u32::try_from(vertices.len())
            .map_err(|_| RigError::InvalidMesh("too many vertices".into()))?;

        vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        faces.extend(
            mesh.indices
                .chunks_exact(3)
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    log::info!(
        "loaded {}: {} models, {} vertices, {} faces",
        path.display(),
        models.len(),
        vertices.len(),
        faces.len()
    );
    Ok(Mesh::new(vertices, faces)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("instarig-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_quad_is_triangulated() {
        let path = write_temp(
            "quad.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_models_are_merged() {
        let path = write_temp(
            "two.obj",
            "o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n\
             o b\nv 5 0 0\nv 6 0 0\nv 5 1 0\nf 4 5 6\n",
        );
        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.faces().iter().flatten().all(|&i| i < 6));
        assert!(mesh.faces().iter().any(|f| f.contains(&5)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let result = load_obj("/nonexistent/instarig/mesh.obj");
        assert!(matches!(result, Err(Error::ObjLoad(_))));
    }
}
