//! Recursive branch growth
//!
//! Starting from a vertical trunk at the origin, every node spawns a
//! decaying number of children at evenly spaced slots along its
//! centerline, plus an occasional extra branch near its tip. All children
//! of a node are created (paths included) before any of them grows its own
//! children, so the random stream is consumed in a fixed order.

use glam::{Quat, Vec3};
use tracing::debug;

use super::{BranchNode, BranchRng, BranchTree, NodeId};
use crate::frame::{seed_normal, slerp_direction};
use crate::settings::{PlantSettings, ResolvedSettings};
use crate::spline::{catmull_rom, polyline_tangent_at, sample_polyline};

/// Fraction of the parent kept clear of branches at each end
const SLOT_MARGIN: f32 = 0.10;
/// Spread of the per-node child count
const COUNT_SIGMA: f32 = 0.35;
/// Parametric window for the extra tip branch
const TIP_WINDOW: (f32, f32) = (0.84, 0.95);
/// Children must be thinner than this fraction of the parent where they attach
const MAX_ATTACH_RATIO: f32 = 0.98;
/// Curviness of every path except the trunk
const CHILD_CURVINESS: f32 = 0.25;

/// Grow a complete branch skeleton
///
/// Pure: the result depends only on `seed` and `settings`.
pub fn build_skeleton(seed: u64, settings: &PlantSettings) -> BranchTree {
    build_resolved(seed, &settings.resolve())
}

/// `build_skeleton` for settings that are already normalized
pub(crate) fn build_resolved(seed: u64, s: &ResolvedSettings) -> BranchTree {
    let mut builder = Builder {
        s,
        rng: BranchRng::new(seed),
        tree: BranchTree::default(),
    };

    let mut trunk = BranchNode {
        order: 0,
        base: Vec3::ZERO,
        direction: Vec3::Y,
        length: s.trunk_height,
        radius: s.trunk_radius,
        centerline: Vec::new(),
        children: Vec::new(),
        parent: None,
        attach_t: 0.0,
        is_tip: false,
    };
    trunk.centerline = builder.branch_path(trunk.base, trunk.direction, trunk.length, s.trunk_curviness);
    let root = builder.tree.push(trunk);
    builder.spawn_children(root);

    let tree = builder.tree;
    debug!(
        seed,
        nodes = tree.len(),
        depth = tree.depth(),
        per_order = ?tree.count_by_order(),
        "built branch skeleton"
    );
    tree
}

struct Builder<'a> {
    s: &'a ResolvedSettings,
    rng: BranchRng,
    tree: BranchTree,
}

impl Builder<'_> {
    fn radius_at(&self, node: &BranchNode, t: f32) -> f32 {
        BranchTree::radius_at(node, &self.s.taper, self.s.min_radius, t)
    }

    fn spawn_children(&mut self, id: NodeId) {
        let parent = self.tree.nodes[id.0].clone();
        let next_order = parent.order + 1;
        if next_order >= self.s.branch_orders {
            return;
        }

        let decay = self.s.branches_per_order_decay.clamp(0.0, 1.0);
        let ideal = self.s.branches_per_order as f32 * decay.powi(next_order as i32 - 1);
        let jittered = (ideal + self.rng.normal_around(0.0, COUNT_SIGMA)).round_ties_even();
        let count = jittered.max(1.0) as usize;

        let step = (1.0 - 2.0 * SLOT_MARGIN) / (count + 1) as f32;
        for i in 1..=count {
            let t = SLOT_MARGIN + i as f32 * step;
            if self.radius_at(&parent, t) < self.s.stop_branch_radius {
                continue;
            }
            self.create_child(&parent, id, next_order, t, false);
        }

        if self.rng.unit() < self.s.tip_branch_chance.clamp(0.0, 1.0) {
            let t = self.rng.range_of(TIP_WINDOW);
            if self.radius_at(&parent, t) >= self.s.stop_branch_radius {
                self.create_child(&parent, id, next_order, t, true);
            }
        }

        let children = self.tree.nodes[id.0].children.clone();
        for child in children {
            self.spawn_children(child);
        }
    }

    fn create_child(&mut self, parent: &BranchNode, parent_id: NodeId, order: u32, t: f32, tip: bool) {
        let s = self.s;
        let spawn = sample_polyline(&parent.centerline, t);
        let parent_dir = polyline_tangent_at(&parent.centerline, t);

        // Low branches and branches near the parent's base spread outward
        let height01 = (parent.base.y / s.trunk_height.max(1e-4)).clamp(0.0, 1.0);
        let outward = (s.plagiotropic_chance + s.canopy_plagiotropic_boost * (1.0 - height01)).clamp(0.0, 1.0);
        let outward = (outward + 0.15 * (1.0 - t)).clamp(0.0, 1.0);

        let bias = s.bias.evaluate(t).clamp(0.0, 1.0);
        let pitch_up = lerp(
            s.pitch_range_deg.0,
            s.pitch_range_deg.1,
            self.rng.unit() * bias + (1.0 - bias) * 0.5,
        );
        let yaw = self.rng.range_of(s.yaw_jitter_deg);

        let side = parent_dir.cross(Vec3::Y);
        let side = if side.length_squared() < 1e-4 { Vec3::X } else { side.normalize() };

        let plagiotropic = self.rng.unit() < outward;
        let (pitch, sign) = if plagiotropic {
            let pitch = self.rng.range_of(s.horizontal_pitch_range_deg);
            (pitch, if self.rng.unit() < 0.65 { -1.0 } else { 1.0 })
        } else {
            (pitch_up, if self.rng.unit() < s.upward_branch_chance { 1.0 } else { -1.0 })
        };

        let q_yaw = Quat::from_axis_angle(parent_dir, yaw.to_radians());
        let q_pitch = Quat::from_axis_angle(side, (sign * pitch).to_radians());
        let mut direction = (q_yaw * q_pitch) * parent_dir;

        let lift = if plagiotropic { s.upward_lift * 0.25 } else { s.upward_lift };
        if lift > 0.0 {
            let amount = lift * lerp(0.6, 1.0, t);
            direction = slerp_direction(direction, Vec3::Y, amount.clamp(0.0, 1.0));
        }
        let direction = direction.normalize_or(Vec3::Y);

        let parent_r = self.radius_at(parent, t);

        let mut length = parent.length
            * self.rng.range_of(s.child_length_scale)
            * s.length_decay_per_order.clamp(0.0, 1.0).powi(order.max(1) as i32);
        if s.branch_orders >= 2 && order == s.branch_orders - 1 {
            length *= s.last_order_len_factor.clamp(0.0, 1.0);
        } else if s.branch_orders >= 3 && order == s.branch_orders - 2 {
            length *= s.near_last_order_len_factor.clamp(0.0, 1.0);
        }
        if tip {
            length *= 0.6;
        }
        let length = length.max(s.min_length);

        let tip_thin = (1.0 - t.clamp(0.0, 1.0)).powf(s.tip_thin_power);
        let mut radius = parent_r * s.child_radius_scale.max(1e-4) * 0.875 * tip_thin.max(0.15);
        if tip {
            radius *= 0.85;
        }
        let max_allowed = (parent_r * s.max_child_to_parent_ratio).max(s.abs_min_twig_radius);
        let radius = radius.max(s.abs_min_twig_radius).min(max_allowed);
        if radius >= parent_r * MAX_ATTACH_RATIO {
            return;
        }

        // Sink the base into the parent so the joint has no gap
        let inset = (radius * 0.6).min((parent_r - radius * 0.25).max(0.0)).max(0.0);
        let base = spawn - direction * inset;

        let centerline = self.branch_path(base, direction, length, CHILD_CURVINESS);
        self.tree.push(BranchNode {
            order,
            base,
            direction,
            length,
            radius,
            centerline,
            children: Vec::new(),
            parent: Some(parent_id),
            attach_t: t,
            is_tip: tip,
        });
    }

    /// Noisy control path from `base` to `base + dir * length`, fitted with
    /// a Catmull-Rom spline
    fn branch_path(&mut self, base: Vec3, dir: Vec3, length: f32, curviness: f32) -> Vec<Vec3> {
        let s = self.s;
        let ctrl = 3 + (curviness * 2.0).round_ties_even().max(0.0) as usize;
        let reduce_up = s.reduce_up_bias_in_curve;
        let up_factor = lerp(0.2, 0.2 * (1.0 - reduce_up), curviness);

        let mut points = Vec::with_capacity(ctrl + 1);
        points.push(base);

        let mut p = base;
        let mut d = dir;
        let mut remain = length;
        for i in 1..ctrl {
            let seg = remain / (ctrl - i + 1) as f32;
            let n1 = seed_normal(d);
            let n2 = d.cross(n1).normalize_or_zero();
            let amp = s.noise_amp * seg;
            let wobble = n1 * self.rng.range(-amp, amp) + n2 * self.rng.range(-amp, amp);

            p += d * seg + wobble + Vec3::Y * (up_factor * seg);
            let lifted = (d + Vec3::Y * (0.35 * (1.0 - reduce_up))).normalize_or(d);
            d = slerp_direction(d, lifted, 0.35);
            points.push(p);
            remain -= seg;
        }
        points.push(base + dir * length);

        catmull_rom(&points, s.curve_samples as usize)
    }
}

/// Linear interpolation with `t` clamped to 0..1
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}
