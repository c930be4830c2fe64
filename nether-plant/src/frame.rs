//! Parallel-transport frames along a polyline
//!
//! A naive per-point frame built from a fixed up vector flips whenever the
//! curve passes through vertical. Here the first normal is seeded once and
//! then carried from sample to sample by the minimal rotation between
//! successive tangents, so the frame never twists on its own.

use glam::{Quat, Vec3};

/// Cross products shorter than this (squared) mean parallel tangents
const PARALLEL_EPSILON: f32 = 1e-12;

/// Orthonormal frame at one polyline sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// Pick a unit normal orthogonal to `tangent`
///
/// Uses world up unless the tangent is nearly vertical, then world right.
pub fn seed_normal(tangent: Vec3) -> Vec3 {
    let t = tangent.normalize_or(Vec3::Y);
    let reference = if t.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
    t.cross(reference).normalize()
}

/// Rotate `normal` by the minimal rotation taking `t_prev` onto `t_next`
///
/// Parallel (or anti-parallel) tangents leave the normal unchanged.
pub fn parallel_transport(normal: Vec3, t_prev: Vec3, t_next: Vec3) -> Vec3 {
    let a = t_prev.normalize_or_zero();
    let b = t_next.normalize_or_zero();
    if a.cross(b).length_squared() < PARALLEL_EPSILON {
        return normal;
    }
    (Quat::from_rotation_arc(a, b) * normal).normalize()
}

/// Spherical interpolation between two directions
///
/// Inputs are normalized first; if either is zero the vectors are blended
/// linearly instead.
pub fn slerp_direction(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    match (a.try_normalize(), b.try_normalize()) {
        (Some(a), Some(b)) => Quat::IDENTITY.slerp(Quat::from_rotation_arc(a, b), t) * a,
        _ => a.lerp(b, t),
    }
}

/// Tangent at sample `i`: central difference inside, one-sided at the ends
///
/// Returns `None` when the neighbouring samples coincide.
pub fn polyline_tangent(points: &[Vec3], i: usize) -> Option<Vec3> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let d = if i == 0 {
        points[1] - points[0]
    } else if i >= n - 1 {
        points[n - 1] - points[n - 2]
    } else {
        points[i + 1] - points[i - 1]
    };
    d.try_normalize()
}

/// Frames at every sample, seeded from the polyline's own start tangent
pub fn propagate_frames(points: &[Vec3]) -> Vec<Frame> {
    let start = polyline_tangent(points, 0).unwrap_or(Vec3::Y);
    propagate_frames_from(points, start)
}

/// Frames at every sample, seeded from `start_tangent`
///
/// The seed normal is built for `start_tangent` and then transported onto
/// the first sample's tangent, so a caller can keep a child's frame
/// continuous with its parent's.
pub fn propagate_frames_from(points: &[Vec3], start_tangent: Vec3) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(points.len());

    let mut t_prev = start_tangent.normalize_or(Vec3::Y);
    let mut normal = seed_normal(t_prev);

    for (i, &position) in points.iter().enumerate() {
        let tangent = polyline_tangent(points, i).unwrap_or(t_prev);
        normal = parallel_transport(normal, t_prev, tangent);
        t_prev = tangent;

        let binormal = tangent.cross(normal).normalize_or_zero();
        frames.push(Frame {
            position,
            tangent,
            normal,
            binormal,
        });
    }

    frames
}
