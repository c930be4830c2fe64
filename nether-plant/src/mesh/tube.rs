//! Tube extrusion along a centerline
//!
//! Sweeps a circular cross-section along a polyline. The centerline is first
//! resampled by arc length so rings are evenly spaced, then each ring is
//! oriented with a parallel-transport frame so the surface does not twist.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::modifiers::{FlipWinding, MeshModifier};
use super::types::{MeshData, TubeMesh, U16_VERTEX_LIMIT};
use crate::curve::RadiusProfile;
use crate::frame::{polyline_tangent, propagate_frames};
use crate::spline::{resample_by_arc_length, span_sample_count};

/// Rings never shrink below this radius
pub const MIN_RING_RADIUS: f32 = 0.0005;

/// Options for `build_tube_mesh`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TubeOptions {
    /// Radial divisions per ring (min 3)
    pub radial_segments: u32,
    /// Rings per span of the input centerline (min 2)
    pub samples_per_span: u32,
    /// Radius before the profile multiplier is applied
    pub base_radius: f32,
    /// Close the start with a disc
    pub cap_start: bool,
    /// Close the end with a disc
    pub cap_end: bool,
    /// Reverse triangle winding after building
    pub flip_faces: bool,
}

impl Default for TubeOptions {
    fn default() -> Self {
        Self {
            radial_segments: 12,
            samples_per_span: 16,
            base_radius: 0.1,
            cap_start: false,
            cap_end: false,
            flip_faces: false,
        }
    }
}

/// Build a tube mesh around `centerline`
///
/// # Layout
/// - `R` rings of `S + 1` vertices (the last duplicates the first at `u = 1`)
/// - Normals point radially outward
/// - UV: `u` = angle fraction around the ring, `v` = ring index fraction
/// - Each enabled cap adds a center vertex plus a copy of its end ring
///
/// Triangles are counter-clockwise seen from outside. A centerline with
/// fewer than two points yields an empty mesh.
pub fn build_tube_mesh(
    centerline: &[Vec3],
    profile: &RadiusProfile,
    options: &TubeOptions,
) -> TubeMesh {
    let ring_count = span_sample_count(centerline.len(), options.samples_per_span as usize);
    let points = resample_by_arc_length(centerline, ring_count);
    if points.len() < 2 {
        return MeshData::new();
    }

    let rings = points.len();
    let segments = options.radial_segments.max(3) as usize;
    let stride = segments + 1;
    let cap_vertices = segments + 2;

    let vertex_total = rings * stride
        + usize::from(options.cap_start) * cap_vertices
        + usize::from(options.cap_end) * cap_vertices;
    let index_total = (rings - 1) * segments * 6
        + (usize::from(options.cap_start) + usize::from(options.cap_end)) * segments * 3;
    let mut mesh = MeshData::with_capacity(vertex_total, index_total);

    let frames = propagate_frames(&points);
    for (i, frame) in frames.iter().enumerate() {
        let v = i as f32 / (rings - 1) as f32;
        let radius = (options.base_radius * profile.evaluate(v)).max(MIN_RING_RADIUS);

        for j in 0..=segments {
            let u = j as f32 / segments as f32;
            let angle = u * TAU;
            let offset = frame.normal * angle.cos() + frame.binormal * angle.sin();
            mesh.add_vertex(
                frame.position + offset * radius,
                (u, v),
                offset.normalize_or_zero(),
            );
        }
    }

    for i in 0..rings - 1 {
        for j in 0..segments {
            let a = (i * stride + j) as u32;
            let b = ((i + 1) * stride + j) as u32;
            let c = ((i + 1) * stride + j + 1) as u32;
            let d = (i * stride + j + 1) as u32;
            mesh.add_triangle(a, c, b);
            mesh.add_triangle(a, d, c);
        }
    }

    if options.cap_start {
        let normal = -polyline_tangent(&points, 0).unwrap_or(Vec3::Y);
        add_disc_cap(&mut mesh, points[0], normal, 0, segments, CapSide::Start);
    }
    if options.cap_end {
        let normal = polyline_tangent(&points, rings - 1).unwrap_or(Vec3::Y);
        add_disc_cap(
            &mut mesh,
            points[rings - 1],
            normal,
            (rings - 1) * stride,
            segments,
            CapSide::End,
        );
    }

    if options.flip_faces {
        FlipWinding.apply(&mut mesh);
    }

    if mesh.vertex_count() > U16_VERTEX_LIMIT {
        tracing::debug!(
            vertices = mesh.vertex_count(),
            "tube mesh uses 32-bit indices"
        );
    }

    mesh
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CapSide {
    Start,
    End,
}

/// Orthonormal basis spanning the plane perpendicular to `normal`
fn basis_from_normal(normal: Vec3) -> (Vec3, Vec3) {
    let n = normal.normalize_or(Vec3::Y);
    let reference = if n.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
    let u = reference.cross(n).normalize();
    let v = n.cross(u).normalize();
    (u, v)
}

/// Triangle fan closing one end of the tube
///
/// Copies the end ring so the cap gets flat normals and its own planar UVs
/// centered at (0.5, 0.5).
fn add_disc_cap(
    mesh: &mut MeshData,
    center: Vec3,
    normal: Vec3,
    ring_start: usize,
    segments: usize,
    side: CapSide,
) {
    let normal = normal.normalize_or(Vec3::Y);
    let center_index = mesh.add_vertex(center, (0.5, 0.5), normal);
    let (basis_u, basis_v) = basis_from_normal(normal);

    let ring_copy_start = mesh.vertex_count() as u32;
    for j in 0..=segments {
        let position = mesh.position((ring_start + j) as u32);
        let d = position - center;
        let du = d.dot(basis_u);
        let dv = d.dot(basis_v);
        let r = (du * du + dv * dv).sqrt();
        let uv = if r < 1e-6 {
            (0.5, 0.5)
        } else {
            (du / (2.0 * r) + 0.5, dv / (2.0 * r) + 0.5)
        };
        mesh.add_vertex(position, uv, normal);
    }

    for j in 0..segments as u32 {
        let a = ring_copy_start + j;
        let b = a + 1;
        // Ring runs counter-clockwise around the tangent; the start cap faces
        // against it
        match side {
            CapSide::Start => mesh.add_triangle(center_index, b, a),
            CapSide::End => mesh.add_triangle(center_index, a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use crate::mesh::types::IndexFormat;

    fn straight() -> Vec<Vec3> {
        vec![Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0)]
    }

    fn face_normal(mesh: &MeshData, tri: [u32; 3]) -> Vec3 {
        let [a, b, c] = tri.map(|i| mesh.position(i));
        (b - a).cross(c - a)
    }

    #[test]
    fn test_straight_two_point_scenario() {
        let options = TubeOptions {
            radial_segments: 8,
            samples_per_span: 2,
            base_radius: 1.0,
            ..Default::default()
        };
        let mesh = build_tube_mesh(&straight(), &Curve::flat(), &options);
        assert_eq!(mesh.vertex_count(), 18);
        assert_eq!(mesh.triangle_count(), 16);
        assert_eq!(mesh.index_format(), IndexFormat::U16);
    }

    #[test]
    fn test_many_radial_segments_keep_counts() {
        let options = TubeOptions {
            radial_segments: 300,
            samples_per_span: 2,
            base_radius: 1.0,
            ..Default::default()
        };
        let mesh = build_tube_mesh(&straight(), &Curve::flat(), &options);
        assert_eq!(mesh.vertex_count(), 2 * 301);
        assert_eq!(mesh.triangle_count(), 300 * 2);
    }

    #[test]
    fn test_counts_with_caps() {
        let centerline: Vec<Vec3> = (0..5).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect();
        let segments = 6;
        let options = TubeOptions {
            radial_segments: segments,
            samples_per_span: 3,
            base_radius: 0.5,
            cap_start: true,
            cap_end: true,
            flip_faces: false,
        };
        let mesh = build_tube_mesh(&centerline, &Curve::flat(), &options);

        let rings = span_sample_count(5, 3);
        let s = segments as usize;
        assert_eq!(mesh.vertex_count(), rings * (s + 1) + 2 * (s + 2));
        assert_eq!(mesh.triangle_count(), (rings - 1) * s * 2 + 2 * s);
    }

    #[test]
    fn test_degenerate_centerline_is_empty() {
        let options = TubeOptions::default();
        assert!(build_tube_mesh(&[], &Curve::flat(), &options).is_empty());
        let single = build_tube_mesh(&[Vec3::ONE], &Curve::flat(), &options);
        assert_eq!(single.vertex_count(), 0);
        assert_eq!(single.triangle_count(), 0);
    }

    #[test]
    fn test_seam_vertex_duplicates_first() {
        let options = TubeOptions {
            radial_segments: 8,
            samples_per_span: 2,
            base_radius: 1.0,
            ..Default::default()
        };
        let mesh = build_tube_mesh(&straight(), &Curve::flat(), &options);
        assert!(mesh.position(0).distance(mesh.position(8)) < 1e-5);
        assert_eq!(mesh.uvs[0][0], 0.0);
        assert_eq!(mesh.uvs[8][0], 1.0);
        assert_eq!(mesh.uvs[9][1], 1.0);
    }

    #[test]
    fn test_normals_radial_and_radius_follows_profile() {
        let options = TubeOptions {
            radial_segments: 8,
            samples_per_span: 2,
            base_radius: 2.0,
            ..Default::default()
        };
        let taper = Curve::linear(0.0, 1.0, 1.0, 0.25);
        let mesh = build_tube_mesh(&straight(), &taper, &options);

        for i in 0..9u32 {
            let p = mesh.position(i);
            let radial = Vec3::new(p.x, 0.0, p.z);
            assert!((radial.length() - 2.0).abs() < 1e-4);
            assert!(mesh.normal(i).distance(radial.normalize()) < 1e-4);
        }
        for i in 9..18u32 {
            let p = mesh.position(i);
            assert!((Vec3::new(p.x, 0.0, p.z).length() - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_side_triangles_face_outward() {
        let options = TubeOptions {
            radial_segments: 10,
            samples_per_span: 4,
            base_radius: 1.0,
            ..Default::default()
        };
        let mesh = build_tube_mesh(&straight(), &Curve::flat(), &options);
        for tri in mesh.triangles() {
            let centroid = tri.map(|i| mesh.position(i)).iter().copied().sum::<Vec3>() / 3.0;
            let outward = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(face_normal(&mesh, tri).dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_caps_face_along_their_normals() {
        let options = TubeOptions {
            radial_segments: 8,
            samples_per_span: 2,
            base_radius: 1.0,
            cap_start: true,
            cap_end: true,
            flip_faces: false,
        };
        let mesh = build_tube_mesh(&straight(), &Curve::flat(), &options);
        let side_tris = 16;
        let tris: Vec<_> = mesh.triangles().collect();

        for &tri in &tris[side_tris..side_tris + 8] {
            assert!(face_normal(&mesh, tri).y < 0.0);
        }
        for &tri in &tris[side_tris + 8..] {
            assert!(face_normal(&mesh, tri).y > 0.0);
        }

        // Center vertex of the start cap
        assert_eq!(mesh.uvs[18], [0.5, 0.5]);
        assert!(mesh.normal(18).distance(Vec3::NEG_Y) < 1e-6);
        for uv in &mesh.uvs[19..28] {
            let d = ((uv[0] - 0.5).powi(2) + (uv[1] - 0.5).powi(2)).sqrt();
            assert!((d - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_flip_faces_reverses_winding() {
        let base = TubeOptions {
            radial_segments: 8,
            samples_per_span: 2,
            base_radius: 1.0,
            ..Default::default()
        };
        let flipped = TubeOptions {
            flip_faces: true,
            ..base
        };
        let a = build_tube_mesh(&straight(), &Curve::flat(), &base);
        let b = build_tube_mesh(&straight(), &Curve::flat(), &flipped);
        for (ta, tb) in a.triangles().zip(b.triangles()) {
            assert!(face_normal(&a, ta).dot(face_normal(&b, tb)) < 0.0);
        }
    }

    #[test]
    fn test_switches_to_u32_indices_for_large_tubes() {
        let centerline: Vec<Vec3> = (0..300).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect();
        let options = TubeOptions {
            radial_segments: 128,
            samples_per_span: 2,
            base_radius: 0.2,
            ..Default::default()
        };
        let mesh = build_tube_mesh(&centerline, &Curve::flat(), &options);
        assert!(mesh.vertex_count() > U16_VERTEX_LIMIT);
        assert_eq!(mesh.index_format(), IndexFormat::U32);
        assert!(mesh.indices.iter().all(|i| (i as usize) < mesh.vertex_count()));
    }
}
