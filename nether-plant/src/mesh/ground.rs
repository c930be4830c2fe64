//! Rolling ground plane under a garden
//!
//! A regular grid on XZ centred on the origin, with heights from three
//! octaves of Perlin noise.

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::modifiers::{MeshApply, SmoothNormals};
use super::types::MeshData;

/// Offset into noise space so the grid does not sit on the lattice origin
const NOISE_OFFSET: f64 = 100.0;

/// Ground plane configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundSettings {
    /// Generate a ground mesh at all
    pub enabled: bool,
    /// Quads along each side
    pub resolution: u32,
    /// Extra width added around the plant row
    pub padding: f32,
    /// Noise frequency in world units
    pub noise_scale: f32,
    /// Height swing of the terrain
    pub height_amplitude: f32,
    /// Perlin permutation seed
    pub noise_seed: u32,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 80,
            padding: 6.0,
            noise_scale: 0.25,
            height_amplitude: 0.6,
            noise_seed: 0,
        }
    }
}

impl GroundSettings {
    /// Height of the terrain at world position (x, z)
    pub fn height_at(&self, perlin: &Perlin, x: f32, z: f32) -> f32 {
        let nx = x as f64 * self.noise_scale as f64 + NOISE_OFFSET;
        let nz = z as f64 * self.noise_scale as f64 + NOISE_OFFSET;
        let sample = |f: f64| ((perlin.get([nx * f, nz * f]) + 1.0) * 0.5).clamp(0.0, 1.0) as f32;

        let layered = sample(1.0) + sample(2.0) * 0.5 + sample(4.0) * 0.25;
        let amp = self.height_amplitude;
        layered * amp * 2.5 - amp
    }
}

/// Build a `width` x `depth` terrain grid
///
/// `(resolution + 1)^2` vertices with UVs spanning 0..1 on both axes;
/// normals are recomputed from the displaced surface and face +Y.
pub fn build_ground_mesh(settings: &GroundSettings, width: f32, depth: f32) -> MeshData {
    let res = settings.resolution.max(1) as usize;
    let verts = res + 1;
    let perlin = Perlin::new(settings.noise_seed);

    let mut mesh = MeshData::with_capacity(verts * verts, res * res * 6);

    for z in 0..verts {
        for x in 0..verts {
            let u = x as f32 / res as f32;
            let v = z as f32 / res as f32;
            let xf = (u - 0.5) * width;
            let zf = (v - 0.5) * depth;
            let y = settings.height_at(&perlin, xf, zf);
            mesh.add_vertex(Vec3::new(xf, y, zf), (u, v), Vec3::Y);
        }
    }

    for z in 0..res {
        for x in 0..res {
            let i = (z * verts + x) as u32;
            let row = verts as u32;
            mesh.add_triangle(i, i + row, i + 1);
            mesh.add_triangle(i + 1, i + row, i + row + 1);
        }
    }

    mesh.apply(SmoothNormals);
    mesh
}
