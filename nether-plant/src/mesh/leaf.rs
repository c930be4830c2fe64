//! Leaf blade mesh
//!
//! A lens-shaped blade lying along +Z with its upper face toward +Y. The
//! blade arches across its width (camber), twists about its length axis
//! toward the tip and carries a thin raised midrib. Both faces are emitted
//! so the leaf renders without backface culling tricks.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::MeshData;

/// Shape parameters for `build_leaf_mesh`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafShape {
    /// Blade length along +Z
    pub length: f32,
    /// Widest extent across the blade
    pub max_width: f32,
    /// Rows along the blade (min 2)
    pub segments_along: u32,
    /// Columns on each side of the midrib (min 2)
    pub segments_across_half: u32,
    /// Arch height at the midrib, relative to `length`
    pub camber: f32,
    /// Rotation about the length axis reached at the tip, in degrees
    pub twist_deg: f32,
    /// Exponent on the width arch; higher is pointier
    pub tip_sharpness: f32,
    /// Width multiplier at the base (1 = no extra narrowing)
    pub base_taper: f32,
    /// Absolute height of the midrib ridge
    pub midrib_thickness: f32,
}

impl Default for LeafShape {
    fn default() -> Self {
        Self {
            length: 0.12,
            max_width: 0.06,
            segments_along: 12,
            segments_across_half: 6,
            camber: 0.15,
            twist_deg: 12.0,
            tip_sharpness: 1.25,
            base_taper: 0.35,
            midrib_thickness: 0.003,
        }
    }
}

impl LeafShape {
    fn half_width(&self, t: f32) -> f32 {
        let arch = (4.0 * t * (1.0 - t)).max(0.0).powf(self.tip_sharpness);
        let base_shrink = self.base_taper + (1.0 - self.base_taper) * t;
        0.5 * self.max_width * arch * base_shrink
    }

    fn camber_at(&self, x_norm: f32, t: f32) -> f32 {
        let edge_falloff = 1.0 - x_norm.abs().powf(1.2);
        let tip_fall = 1.0 + (0.4 - 1.0) * t.powf(1.1);
        self.camber * edge_falloff * tip_fall
    }

    fn twist_rad(&self, t: f32) -> f32 {
        self.twist_deg.to_radians() * t.powf(1.1)
    }
}

/// Build a double-sided leaf blade
///
/// # Layout
/// - Front sheet: `(segments_along + 1) * (2 * segments_across_half + 1)` vertices
/// - Back sheet: a copy of the front with negated normals and reversed winding
/// - UV: `u` across the blade (0 = left edge), `v` from base (0) to tip (1)
pub fn build_leaf_mesh(shape: &LeafShape) -> MeshData {
    let along = shape.segments_along.max(2) as usize;
    let across = shape.segments_across_half.max(2) as usize * 2 + 1;
    let rows = along + 1;
    let sheet = rows * across;
    let quads = along * (across - 1);

    let mut mesh = MeshData::with_capacity(sheet * 2, quads * 12);

    for i in 0..rows {
        let t = i as f32 / along as f32;
        let z = t * shape.length;
        let hw = shape.half_width(t);
        let (sin, cos) = shape.twist_rad(t).sin_cos();

        for j in 0..across {
            let u = j as f32 / (across - 1) as f32;
            let xn = u * 2.0 - 1.0;
            let x = xn * hw;
            let mid_weight = (-(xn * 2.0).powi(2) * 3.0).exp();
            let y = shape.camber_at(xn, t) * shape.length + mid_weight * shape.midrib_thickness;

            let position = Vec3::new(cos * x - sin * y, sin * x + cos * y, z);
            let n = Vec3::new(-0.15 * xn, 1.0, -0.25).normalize();
            let normal = Vec3::new(cos * n.x - sin * n.y, sin * n.x + cos * n.y, n.z).normalize();

            mesh.add_vertex(position, (u, t), normal);
        }
    }

    for i in 0..along {
        for j in 0..across - 1 {
            let a = (i * across + j) as u32;
            let b = ((i + 1) * across + j) as u32;
            let c = ((i + 1) * across + j + 1) as u32;
            let d = (i * across + j + 1) as u32;
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
        }
    }

    // Back face
    for k in 0..sheet as u32 {
        let uv = mesh.uvs[k as usize];
        mesh.add_vertex(mesh.position(k), (uv[0], uv[1]), -mesh.normal(k));
    }
    let base = sheet;
    for i in 0..along {
        for j in 0..across - 1 {
            let a = (base + i * across + j) as u32;
            let b = (base + (i + 1) * across + j) as u32;
            let c = (base + (i + 1) * across + j + 1) as u32;
            let d = (base + i * across + j + 1) as u32;
            mesh.add_triangle(a, c, b);
            mesh.add_triangle(a, d, c);
        }
    }

    mesh
}
