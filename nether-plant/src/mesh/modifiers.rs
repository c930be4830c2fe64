//! Mesh modifiers
//!
//! Small in-place operations on `MeshData`, chainable through `MeshApply`:
//! ```
//! use nether_plant::mesh::*;
//!
//! let mut leaf = build_leaf_mesh(&LeafShape::default());
//! leaf.apply(Transform::scale_uniform(0.3))
//!     .apply(Transform::translate(0.0, 2.0, 0.0))
//!     .apply(FlipWinding);
//! ```

use glam::{Mat4, Quat, Vec3};

use super::types::MeshData;

/// Trait for mesh modifiers
pub trait MeshModifier {
    /// Apply this modifier to a mesh, modifying it in place
    fn apply(&self, mesh: &mut MeshData);
}

/// Extension trait for fluent modifier application
pub trait MeshApply {
    /// Apply a modifier and return `&mut Self` for chaining
    fn apply<M: MeshModifier>(&mut self, modifier: M) -> &mut Self;
}

impl MeshApply for MeshData {
    fn apply<M: MeshModifier>(&mut self, modifier: M) -> &mut Self {
        modifier.apply(self);
        self
    }
}

/// Transform mesh vertices and normals using a 4x4 matrix
///
/// Normals are transformed using the inverse-transpose to handle non-uniform
/// scaling correctly.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    matrix: Mat4,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        Self {
            matrix: Mat4::from_translation(Vec3::new(x, y, z)),
        }
    }

    pub fn scale_uniform(s: f32) -> Self {
        Self {
            matrix: Mat4::from_scale(Vec3::splat(s)),
        }
    }

    /// Scale, then rotate, then translate
    pub fn from_scale_rotation_translation(scale: f32, rotation: Quat, translation: Vec3) -> Self {
        Self {
            matrix: Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, translation),
        }
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }
}

impl MeshModifier for Transform {
    fn apply(&self, mesh: &mut MeshData) {
        let normal_matrix = self.matrix.inverse().transpose();

        for pos in &mut mesh.positions {
            *pos = self.matrix.transform_point3(Vec3::from(*pos)).to_array();
        }

        for normal in &mut mesh.normals {
            *normal = normal_matrix
                .transform_vector3(Vec3::from(*normal))
                .normalize_or_zero()
                .to_array();
        }
    }
}

/// Reverse the winding of every triangle
///
/// Swaps the first two indices of each triangle. Normals are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlipWinding;

impl MeshModifier for FlipWinding {
    fn apply(&self, mesh: &mut MeshData) {
        for t in 0..mesh.triangle_count() {
            mesh.indices.swap(t * 3, t * 3 + 1);
        }
    }
}

/// Recompute vertex normals from the triangles that share each vertex
///
/// Face normals are accumulated unnormalized, so larger triangles weigh
/// more. Vertices touched by no triangle keep their normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothNormals;

impl MeshModifier for SmoothNormals {
    fn apply(&self, mesh: &mut MeshData) {
        let mut accum = vec![Vec3::ZERO; mesh.vertex_count()];

        for [a, b, c] in mesh.triangles() {
            let p0 = mesh.position(a);
            let face = (mesh.position(b) - p0).cross(mesh.position(c) - p0);
            accum[a as usize] += face;
            accum[b as usize] += face;
            accum[c as usize] += face;
        }

        for (normal, sum) in mesh.normals.iter_mut().zip(accum) {
            if let Some(n) = sum.try_normalize() {
                *normal = n.to_array();
            }
        }
    }
}
