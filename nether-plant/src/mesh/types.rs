//! Mesh container types
//!
//! Shared storage for every generated surface (branch tubes, leaves, ground).

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Meshes with more vertices than this switch to 32-bit indices
pub const U16_VERTEX_LIMIT: usize = 65000;

/// Width of the triangle index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

/// Triangle indices, narrowed to 16 bits while the vertex count allows it
#[derive(Debug, Clone, PartialEq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::U16,
            Self::U32(_) => IndexFormat::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> u32 {
        match self {
            Self::U16(v) => v[i] as u32,
            Self::U32(v) => v[i],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        match self {
            Self::U16(v) => v.swap(a, b),
            Self::U32(v) => v.swap(a, b),
        }
    }

    /// Raw little-endian bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }

    fn push(&mut self, index: u32) {
        match self {
            // Promotion happens before any index above the u16 range exists
            Self::U16(v) => v.push(index as u16),
            Self::U32(v) => v.push(index),
        }
    }

    fn promote(&mut self) {
        if let Self::U16(v) = self {
            *self = Self::U32(v.iter().map(|&i| i as u32).collect());
        }
    }
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::U16(Vec::new())
    }
}

/// Interleaved vertex layout: position, normal, uv (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Unpacked mesh data (f32 format)
///
/// Positions, normals and UVs are parallel arrays; `indices` holds one
/// triangle per three entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions as [x, y, z]
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals as [x, y, z]
    pub normals: Vec<[f32; 3]>,
    /// UV coordinates as [u, v]
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices
    pub indices: IndexBuffer,
}

/// A branch surface produced by the tube mesher
pub type TubeMesh = MeshData;

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty mesh with room for `vertices` and `indices`
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        let index_buffer = if vertices > U16_VERTEX_LIMIT {
            IndexBuffer::U32(Vec::with_capacity(indices))
        } else {
            IndexBuffer::U16(Vec::with_capacity(indices))
        };
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: index_buffer,
        }
    }

    /// Add a vertex and return its index
    ///
    /// Crossing `U16_VERTEX_LIMIT` vertices promotes the index buffer to
    /// 32 bits.
    pub fn add_vertex(&mut self, position: Vec3, uv: (f32, f32), normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.uvs.push([uv.0, uv.1]);
        if self.positions.len() > U16_VERTEX_LIMIT {
            self.indices.promote();
        }
        index
    }

    /// Add a triangle using three vertex indices
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    pub fn position(&self, index: u32) -> Vec3 {
        Vec3::from(self.positions[index as usize])
    }

    pub fn normal(&self, index: u32) -> Vec3 {
        Vec3::from(self.normals[index as usize])
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn index_format(&self) -> IndexFormat {
        self.indices.format()
    }

    /// Iterate triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        (0..self.triangle_count()).map(move |t| {
            [
                self.indices.get(t * 3),
                self.indices.get(t * 3 + 1),
                self.indices.get(t * 3 + 2),
            ]
        })
    }

    /// Append another mesh, offsetting its indices
    pub fn append(&mut self, other: &MeshData) {
        let base = self.positions.len() as u32;
        for i in 0..other.vertex_count() {
            let uv = other.uvs.get(i).copied().unwrap_or([0.0, 0.0]);
            self.add_vertex(
                Vec3::from(other.positions[i]),
                (uv[0], uv[1]),
                Vec3::from(other.normals[i]),
            );
        }
        for [a, b, c] in other.triangles() {
            self.add_triangle(base + a, base + b, base + c);
        }
    }

    /// Interleaved vertex buffer for GPU upload
    pub fn interleaved(&self) -> Vec<PackedVertex> {
        (0..self.vertex_count())
            .map(|i| PackedVertex {
                position: self.positions[i],
                normal: self.normals[i],
                uv: self.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        let mut mesh = MeshData::new();
        let a = mesh.add_vertex(Vec3::ZERO, (0.0, 0.0), Vec3::Z);
        let b = mesh.add_vertex(Vec3::X, (1.0, 0.0), Vec3::Z);
        let c = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0), (1.0, 1.0), Vec3::Z);
        let d = mesh.add_vertex(Vec3::Y, (0.0, 1.0), Vec3::Z);
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.index_format(), IndexFormat::U16);
        assert_eq!(mesh.triangles().nth(1), Some([0, 2, 3]));
    }

    #[test]
    fn test_promotes_past_u16_limit() {
        let mut mesh = MeshData::new();
        for i in 0..U16_VERTEX_LIMIT {
            mesh.add_vertex(Vec3::splat(i as f32), (0.0, 0.0), Vec3::Y);
        }
        mesh.add_triangle(0, 1, 2);
        assert_eq!(mesh.index_format(), IndexFormat::U16);

        let last = mesh.add_vertex(Vec3::ZERO, (0.0, 0.0), Vec3::Y);
        assert_eq!(mesh.index_format(), IndexFormat::U32);
        mesh.add_triangle(0, 1, last);
        assert_eq!(mesh.triangles().nth(1), Some([0, 1, 65000]));
        assert_eq!(mesh.triangles().next(), Some([0, 1, 2]));
    }

    #[test]
    fn test_append_offsets_indices() {
        let mut mesh = quad();
        mesh.append(&quad());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangles().nth(3), Some([4, 6, 7]));
    }

    #[test]
    fn test_interleaved_layout() {
        let mesh = quad();
        let packed = mesh.interleaved();
        assert_eq!(std::mem::size_of::<PackedVertex>(), 32);
        assert_eq!(bytemuck::cast_slice::<PackedVertex, u8>(&packed).len(), 4 * 32);
        assert_eq!(packed[2].uv, [1.0, 1.0]);
        assert_eq!(mesh.indices.as_bytes().len(), 6 * 2);
    }
}
