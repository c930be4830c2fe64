//! Spline fitting and polyline resampling
//!
//! Branch control paths are sparse and noisy. `catmull_rom` turns them into a
//! dense smooth centerline, and `resample_by_arc_length` redistributes any
//! polyline so that samples are evenly spaced along its length before the
//! tube mesher builds rings on it.

use glam::Vec3;

/// Segments shorter than this are treated as coincident points
const COINCIDENT_EPSILON: f32 = 1e-8;

/// Evaluate one uniform Catmull-Rom span between `p1` and `p2`
#[inline]
pub fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Fit a Catmull-Rom spline through `control` points
///
/// End spans use duplicated endpoints as phantom neighbours, so the curve
/// passes through every control point and the first and last outputs are
/// exactly the first and last control points.
///
/// With fewer than three control points there is nothing to smooth and the
/// input is returned unchanged. Otherwise the output holds
/// `(control.len() - 1) * samples_per_span + 1` points.
pub fn catmull_rom(control: &[Vec3], samples_per_span: usize) -> Vec<Vec3> {
    if control.len() <= 2 {
        return control.to_vec();
    }

    let samples_per_span = samples_per_span.max(1);
    let last = control.len() - 1;
    let at = |i: isize| control[i.clamp(0, last as isize) as usize];

    let mut points = Vec::with_capacity(last * samples_per_span + 1);
    for span in 0..last as isize {
        let (p0, p1, p2, p3) = (at(span - 1), at(span), at(span + 1), at(span + 2));
        points.push(p1);
        for j in 1..samples_per_span {
            let t = j as f32 / samples_per_span as f32;
            points.push(catmull_rom_point(p0, p1, p2, p3, t));
        }
    }
    points.push(control[last]);
    points
}

/// Total length of a polyline
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Number of rings the tube mesher resamples a centerline to
///
/// Every span of the source polyline gets at least two samples, and the
/// result is never below two.
pub fn span_sample_count(point_count: usize, samples_per_span: usize) -> usize {
    (point_count.saturating_sub(1) * samples_per_span.max(2)).max(2)
}

/// Resample a polyline into `count` points evenly spaced by arc length
///
/// The first and last input points are preserved exactly. Zero-length
/// segments are skipped. Inputs with fewer than two points are returned
/// unchanged, and `count` below two is raised to two.
pub fn resample_by_arc_length(points: &[Vec3], count: usize) -> Vec<Vec3> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let count = count.max(2);
    let total = polyline_length(points);
    let step = total / (count - 1) as f32;
    let last_segment = points.len() - 2;

    let mut out = Vec::with_capacity(count);
    out.push(points[0]);

    let mut acc = 0.0;
    let mut seg = 0;
    let mut seg_len = points[0].distance(points[1]);

    for s in 1..count - 1 {
        let target = s as f32 * step;
        while acc + seg_len < target && seg < last_segment {
            acc += seg_len;
            seg += 1;
            seg_len = points[seg].distance(points[seg + 1]);
        }

        let t = if seg_len > COINCIDENT_EPSILON {
            ((target - acc) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(points[seg].lerp(points[seg + 1], t));
    }

    out.push(points[points.len() - 1]);
    out
}

/// Point at parametric position `t` (0..1) by index, not arc length
pub fn sample_polyline(points: &[Vec3], t: f32) -> Vec3 {
    match points.len() {
        0 => Vec3::ZERO,
        1 => points[0],
        n => {
            let f = t.clamp(0.0, 1.0) * (n - 1) as f32;
            let i = (f.floor() as usize).min(n - 2);
            points[i].lerp(points[i + 1], f - i as f32)
        }
    }
}

/// Unit direction of the polyline around parametric position `t`
///
/// Uses a central difference a small parametric step either side of `t`;
/// falls back to world up when the neighbourhood is degenerate.
pub fn polyline_tangent_at(points: &[Vec3], t: f32) -> Vec3 {
    let eps = 1.0 / points.len().max(8) as f32;
    let a = sample_polyline(points, (t - eps).clamp(0.0, 1.0));
    let b = sample_polyline(points, (t + eps).clamp(0.0, 1.0));
    let d = b - a;
    if d.length_squared() < 1e-6 {
        Vec3::Y
    } else {
        d.normalize()
    }
}
