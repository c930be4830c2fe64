//! Leaf canopy placement
//!
//! Leaves are anchored on branch tube vertices. A vertex's UV `v` is its
//! position along the branch (0 base, 1 tip), so filtering by `v` picks the
//! outer part of each branch, and walking `u` by the golden angle spreads
//! successive leaves around it.
//!
//! Placement runs in three passes:
//! 1. a small guaranteed share for every non-trunk branch,
//! 2. round-robin single leaves until each branch reaches its order-weighted
//!    target or the global maximum is hit,
//! 3. a top-up over loose `v` bands when the total is still under the minimum.

use std::f32::consts::TAU;
use std::path::Path;

use glam::{EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{Gradient, hsv_to_rgb, lerp_rgb, rgb_to_hsv};
use crate::curve::Curve;
use crate::error::{PlantError, Result};
use crate::frame::slerp_direction;
use crate::mesh::{LeafShape, MeshData};
use crate::plant::Plant;
use crate::skeleton::{BranchRng, NodeId};

/// Golden angle in radians
const GOLDEN_ANGLE: f32 = 137.507_76_f32 * (std::f32::consts::PI / 180.0);
/// Mixed into the plant seed so leaves do not replay the skeleton's stream
const SEED_SALT: u64 = 0x9E37_79B9;
/// Upper bound on the order-weighted per-branch target
const MAX_TARGET_PER_BRANCH: i32 = 64;

/// One placed leaf, in plant space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafInstance {
    /// Branch the leaf hangs from
    pub node: NodeId,
    pub position: Vec3,
    /// Turns the blade template (+Z along the blade, +Y face) into place
    pub rotation: Quat,
    /// Uniform scale applied to the blade template
    pub scale: f32,
    /// Linear RGBA
    pub color: [f32; 4],
}

/// Leaf distribution, shape and colour parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafCanopySettings {
    // Distribution
    pub v_min: f32,
    pub v_max: f32,
    /// Target leaves on an outermost branch
    pub leaves_per_tip_ref: u32,

    // Order coverage
    pub cover_all_orders: bool,
    pub min_covered_order: u32,
    /// Orders counted back from the outermost when not covering all
    pub include_orders_back: u32,
    /// Target weight from outermost (0) to innermost (1) covered order
    pub order_weight: Curve,
    /// How far `v_min` drops for the innermost covered order
    pub relax_v_min_for_inner: f32,

    // Per-branch guarantee
    pub ensure_every_branch: bool,
    pub per_branch_guarantee: u32,
    pub per_branch_fallback_v: (f32, f32),
    pub shuffle_branches: bool,

    // Global limits
    pub max_leaves_total: u32,
    pub min_leaves_total: u32,
    pub fallback_v: (f32, f32),

    // Shape
    pub leaf_size_range: (f32, f32),
    /// Blade template; instance scale multiplies it
    pub leaf_shape: LeafShape,
    pub size_along_v: Curve,
    pub size_by_order: Curve,

    // Colour
    pub color_along_v: Gradient,
    pub color_by_order: Gradient,
    /// 0 = order colour, 1 = along-branch colour
    pub color_blend: f32,
    pub use_base_tip_gradient: bool,
    pub base_tip_gradient: Gradient,
    pub base_tip_weight: f32,
    pub hue_jitter: f32,
    pub sat_jitter: f32,
    pub val_jitter: f32,

    // Orientation
    /// How far the leaf face turns from the surface normal toward world up
    pub up_facing: f32,
    pub rand_pitch_deg: f32,
    pub rand_yaw_deg: f32,
    pub rand_roll_deg: f32,

    pub global_size: f32,
}

impl Default for LeafCanopySettings {
    fn default() -> Self {
        Self {
            v_min: 0.50,
            v_max: 0.95,
            leaves_per_tip_ref: 20,
            cover_all_orders: true,
            min_covered_order: 1,
            include_orders_back: 3,
            order_weight: Curve::from_points(&[(0.0, 1.0), (0.5, 0.65), (1.0, 0.4)]),
            relax_v_min_for_inner: 0.15,
            ensure_every_branch: true,
            per_branch_guarantee: 3,
            per_branch_fallback_v: (0.30, 0.98),
            shuffle_branches: true,
            max_leaves_total: 4000,
            min_leaves_total: 1600,
            fallback_v: (0.35, 0.98),
            leaf_size_range: (0.25, 0.40),
            leaf_shape: LeafShape {
                length: 1.0,
                max_width: 0.55,
                segments_along: 10,
                segments_across_half: 6,
                camber: 0.16,
                twist_deg: 9.0,
                tip_sharpness: 1.25,
                base_taper: 0.35,
                midrib_thickness: 0.0025,
            },
            size_along_v: Curve::from_points(&[(0.0, 0.95), (0.45, 1.15), (1.0, 0.85)]),
            size_by_order: Curve::from_points(&[(0.0, 1.05), (1.0, 0.92)]),
            color_along_v: Gradient::from_stops(&[
                (0.0, [0.13, 0.42, 0.18]),
                (0.5, [0.18, 0.55, 0.22]),
                (1.0, [0.28, 0.70, 0.30]),
            ]),
            color_by_order: Gradient::from_stops(&[
                (0.0, [0.16, 0.50, 0.22]),
                (1.0, [0.20, 0.68, 0.28]),
            ]),
            color_blend: 0.6,
            use_base_tip_gradient: true,
            base_tip_gradient: Gradient::from_stops(&[
                (0.0, [0.10, 0.35, 0.15]),
                (0.6, [0.22, 0.65, 0.25]),
                (1.0, [0.32, 0.78, 0.28]),
            ]),
            base_tip_weight: 0.85,
            hue_jitter: 0.02,
            sat_jitter: 0.10,
            val_jitter: 0.10,
            up_facing: 0.35,
            rand_pitch_deg: 10.0,
            rand_yaw_deg: 80.0,
            rand_roll_deg: 8.0,
            global_size: 1.2,
        }
    }
}

impl LeafCanopySettings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PlantError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// A branch mesh eligible for leaves
struct Candidate<'a> {
    node: NodeId,
    order: u32,
    mesh: &'a MeshData,
    placed: usize,
    target: usize,
    /// 0 for the outermost covered order, 1 for the innermost
    inner: f32,
}

/// Place leaves over a plant's branch meshes
///
/// Deterministic for a given plant seed and settings. The result never
/// holds more than `max_leaves_total` leaves.
pub fn decorate_leaves(plant: &Plant, canopy: &LeafCanopySettings) -> Vec<LeafInstance> {
    let Some(max_order) = plant.branches.iter().map(|b| b.order).max() else {
        return Vec::new();
    };

    let base_min = u32::from(canopy.use_base_tip_gradient);
    let coverage_min = if canopy.cover_all_orders {
        canopy.min_covered_order
    } else {
        max_order.saturating_sub(canopy.include_orders_back.saturating_sub(1))
    };
    let min_order = base_min.max(coverage_min);

    let mut candidates: Vec<Candidate> = plant
        .branches
        .iter()
        .filter(|b| b.order >= min_order)
        .map(|b| {
            let inner = if min_order >= max_order {
                0.0
            } else {
                inverse_lerp(max_order as f32, min_order as f32, b.order as f32)
            };
            let weight = canopy.order_weight.evaluate(inner).clamp(0.0, 1.0);
            let target = (canopy.leaves_per_tip_ref as f32 * weight)
                .round_ties_even()
                .clamp(0.0, MAX_TARGET_PER_BRANCH as f32) as usize;
            Candidate {
                node: b.node,
                order: b.order,
                mesh: &b.mesh,
                placed: 0,
                target,
                inner,
            }
        })
        .collect();

    let mut placer = Placer {
        canopy,
        rng: BranchRng::new(plant.settings.seed ^ SEED_SALT),
        max_order,
        leaves: Vec::new(),
    };
    if canopy.shuffle_branches {
        placer.rng.shuffle(&mut candidates);
    }

    let max_total = canopy.max_leaves_total as usize;

    if canopy.ensure_every_branch {
        for c in candidates.iter_mut() {
            if placer.leaves.len() >= max_total {
                break;
            }
            if c.order == 0 {
                continue;
            }
            let pool = filter_by_v(c.mesh, canopy.per_branch_fallback_v);
            if pool.is_empty() {
                continue;
            }
            let count = (canopy.per_branch_guarantee as usize).min(max_total - placer.leaves.len());
            placer.place(c, &pool, count, true);
        }
    }

    let mut placed_in_round = true;
    while placed_in_round && placer.leaves.len() < max_total {
        placed_in_round = false;
        for c in candidates.iter_mut() {
            if placer.leaves.len() >= max_total {
                break;
            }
            let v_min = (canopy.v_min - canopy.relax_v_min_for_inner * c.inner).clamp(0.0, 1.0);
            let pool = filter_by_v(c.mesh, (v_min, canopy.v_max));
            if pool.is_empty() {
                continue;
            }
            if c.placed >= c.target.max(canopy.per_branch_guarantee as usize) {
                continue;
            }
            if placer.place(c, &pool, 1, true) > 0 {
                placed_in_round = true;
            }
        }
    }

    let min_target = (canopy.min_leaves_total as usize).min(max_total);
    if placer.leaves.len() < min_target {
        for c in candidates.iter_mut() {
            let remaining = min_target.saturating_sub(placer.leaves.len());
            if remaining == 0 {
                break;
            }
            let pool = filter_by_v(c.mesh, canopy.fallback_v);
            if pool.is_empty() {
                continue;
            }
            placer.place(c, &pool, remaining.min(2), false);
        }
    }

    debug!(
        leaves = placer.leaves.len(),
        branches = candidates.len(),
        "decorated canopy"
    );
    placer.leaves
}

struct Placer<'a> {
    canopy: &'a LeafCanopySettings,
    rng: BranchRng,
    max_order: u32,
    leaves: Vec<LeafInstance>,
}

impl Placer<'_> {
    /// Place up to `count` leaves on one branch, returning how many landed
    fn place(&mut self, c: &mut Candidate, pool: &[usize], count: usize, bias_to_tip: bool) -> usize {
        let uvs = &c.mesh.uvs;
        let (v_lo, v_hi) = pool.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &i| {
            (lo.min(uvs[i][1]), hi.max(uvs[i][1]))
        });

        let mut made = 0;
        for k in 0..count {
            let r = self.rng.unit();
            let along = if bias_to_tip { r.powf(0.6) } else { r };
            let v_target = v_lo + (v_hi - v_lo) * along;
            let angle = (c.placed + k) as f32 * GOLDEN_ANGLE;
            let u_target = (angle / TAU).rem_euclid(1.0);

            let Some(best) = closest_uv(pool, uvs, u_target, v_target) else {
                break;
            };
            let leaf = self.spawn(c, best);
            self.leaves.push(leaf);
            made += 1;
        }
        c.placed += made;
        made
    }

    fn spawn(&mut self, c: &Candidate, vertex: usize) -> LeafInstance {
        let canopy = self.canopy;
        let anchor = c.mesh.position(vertex as u32);
        let v = c.mesh.uvs[vertex][1].clamp(0.0, 1.0);

        let n = c.mesh.normal(vertex as u32).try_normalize().unwrap_or(Vec3::Y);
        let up = slerp_direction(n, Vec3::Y, canopy.up_facing.clamp(0.0, 1.0)).normalize_or(Vec3::Y);
        let tangent = n.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);

        let position = anchor + up * (0.01 * self.rng.unit());

        let order_norm = if self.max_order == 0 {
            1.0
        } else {
            inverse_lerp(
                self.max_order.saturating_sub(5) as f32,
                self.max_order as f32,
                c.order as f32,
            )
        };
        let size_base = self.rng.range_of(canopy.leaf_size_range);
        let scale = size_base
            * canopy.size_along_v.evaluate(v)
            * canopy.size_by_order.evaluate(order_norm)
            * canopy.global_size.max(0.01);

        let face = look_rotation(up.cross(tangent), up);
        let pitch = self.rng.range(-canopy.rand_pitch_deg, canopy.rand_pitch_deg);
        let yaw = self.rng.range(-canopy.rand_yaw_deg, canopy.rand_yaw_deg);
        let roll = self.rng.range(-canopy.rand_roll_deg, canopy.rand_roll_deg);
        let jitter = Quat::from_euler(
            EulerRot::YXZ,
            yaw.to_radians(),
            pitch.to_radians(),
            roll.to_radians(),
        );

        let along = canopy.color_along_v.evaluate(v);
        let by_order = canopy.color_by_order.evaluate(order_norm);
        let mix = lerp_rgb(by_order, along, canopy.color_blend);
        let base_tip = if canopy.use_base_tip_gradient {
            canopy.base_tip_gradient.evaluate(v)
        } else {
            mix
        };
        let rgb = lerp_rgb(mix, base_tip, canopy.base_tip_weight.clamp(0.0, 1.0));

        let (h, s, val) = rgb_to_hsv(rgb);
        let h = (h + self.rng.range(-canopy.hue_jitter, canopy.hue_jitter)).rem_euclid(1.0);
        let s = (s * (1.0 + self.rng.range(-canopy.sat_jitter, canopy.sat_jitter))).clamp(0.0, 1.0);
        let val = (val * (1.0 + self.rng.range(-canopy.val_jitter, canopy.val_jitter))).clamp(0.0, 1.0);
        let [r, g, b] = hsv_to_rgb(h, s, val);

        LeafInstance {
            node: c.node,
            position,
            rotation: (jitter * face).normalize(),
            scale,
            color: [r, g, b, 1.0],
        }
    }
}

/// Rotation taking +Z to `forward` and +Y to `up`
fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(z) = forward.try_normalize() else {
        return Quat::from_rotation_arc(Vec3::Y, up.normalize_or(Vec3::Y));
    };
    let x = up.cross(z).normalize_or(Vec3::X);
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Vertices whose `v` lies in `range` (inclusive)
fn filter_by_v(mesh: &MeshData, range: (f32, f32)) -> Vec<usize> {
    mesh.uvs
        .iter()
        .enumerate()
        .filter(|(_, uv)| uv[1] >= range.0 && uv[1] <= range.1)
        .map(|(i, _)| i)
        .collect()
}

/// Pool vertex nearest to (u, v), with `u` wrapping around the branch
fn closest_uv(pool: &[usize], uvs: &[[f32; 2]], u: f32, v: f32) -> Option<usize> {
    pool.iter()
        .map(|&i| {
            let du = (uvs[i][0] - u).abs();
            let du = du.min(1.0 - du);
            let dv = (uvs[i][1] - v).abs();
            (i, du * du * 0.6 + dv * dv)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
