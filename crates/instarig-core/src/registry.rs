//! Mesh registry: resolves host-side geometry names to mesh data.

use std::collections::HashMap;

use crate::error::{Result, RigError};
use crate::mesh::Mesh;

/// Registry for meshes addressed by name.
#[derive(Debug, Default)]
pub struct Registry {
    meshes: HashMap<String, Mesh>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh under `name`.
    ///
    /// Returns an error if a mesh with the same name already exists.
    pub fn register(&mut self, name: impl Into<String>, mesh: Mesh) -> Result<()> {
        let name = name.into();
        if self.meshes.contains_key(&name) {
            return Err(RigError::MeshExists(name));
        }
        self.meshes.insert(name, mesh);
        Ok(())
    }

    /// Gets a mesh by name.
    pub fn get(&self, name: &str) -> Option<&Mesh> {
        self.meshes.get(name)
    }

    /// Gets a mesh by name, or a [`RigError::MeshNotFound`] error.
    pub fn resolve(&self, name: &str) -> Result<&Mesh> {
        self.get(name)
            .ok_or_else(|| RigError::MeshNotFound(name.to_string()))
    }

    /// Checks if a mesh with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    /// Removes a mesh by name.
    pub fn remove(&mut self, name: &str) -> Option<Mesh> {
        self.meshes.remove(name)
    }

    /// Removes all meshes.
    pub fn clear(&mut self) {
        self.meshes.clear();
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.meshes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
