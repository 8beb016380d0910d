/// Geometry: vertex/index data with a primitive topology.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use crate::camera::Aabb;
use crate::error::{Error, Result};

/// Interleaved vertex: position followed by linear RGB colour
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, color: [f32; 3]) -> Self {
        Self { position: position.to_array(), color }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Triangle list (indexed or every three vertices)
    Triangles,
    /// One point per vertex
    Points,
}

/// Renderable geometry produced by an asset loader or procedurally
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    name: String,
    topology: Topology,
    vertices: Vec<Vertex>,
    indices: Option<Vec<u32>>,
}

impl Geometry {
    /// Point set, one point per vertex
    pub fn points(name: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        Self {
            name: name.into(),
            topology: Topology::Points,
            vertices,
            indices: None,
        }
    }

    /// Indexed triangle list.
    ///
    /// Fails if the index count is not a multiple of 3 or an index is out of range.
    pub fn indexed_triangles(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        let name = name.into();
        if indices.len() % 3 != 0 {
            return Err(Error::AssetUnavailable(format!(
                "Geometry '{}': index count {} is not a multiple of 3", name, indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::AssetUnavailable(format!(
                "Geometry '{}': index {} out of range ({} vertices)", name, bad, vertices.len()
            )));
        }
        Ok(Self {
            name,
            topology: Topology::Triangles,
            vertices,
            indices: Some(indices),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Triangles for triangle lists, points for point sets
    pub fn primitive_count(&self) -> usize {
        match (self.topology, &self.indices) {
            (Topology::Points, _) => self.vertices.len(),
            (Topology::Triangles, Some(indices)) => indices.len() / 3,
            (Topology::Triangles, None) => self.vertices.len() / 3,
        }
    }

    /// Bounding box of all vertices, `None` when empty
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(Vertex::position))
    }

    /// Raw vertex bytes, as uploaded to a GPU buffer
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes (empty when non-indexed)
    pub fn index_bytes(&self) -> &[u8] {
        match &self.indices {
            Some(indices) => bytemuck::cast_slice::<u32, u8>(indices),
            None => &[],
        }
    }

    /// Total size of vertex and index data in bytes
    pub fn byte_size(&self) -> usize {
        self.vertex_bytes().len() + self.index_bytes().len()
    }

    /// Copy translated so the bounding-box center sits at the origin
    pub fn centered(&self) -> Self {
        let Some(bounds) = self.bounds() else {
            return self.clone();
        };
        let offset = bounds.center();
        let mut centered = self.clone();
        for vertex in &mut centered.vertices {
            vertex.position = (vertex.position() - offset).to_array();
        }
        centered
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
