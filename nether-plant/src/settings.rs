//! Plant generation settings
//!
//! `PlantSettings` is what callers write (in code or TOML). Before a build it
//! is normalized into `ResolvedSettings`: nonsensical values are replaced by
//! working fallbacks and the orientation ranges are pinned. Every override of
//! a caller-supplied value is reported with `tracing::warn!`.

use std::ops::Deref;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::curve::{Curve, RadiusProfile};
use crate::error::{PlantError, Result};

/// Up-pitch range every build uses, in degrees
pub const PITCH_RANGE_DEG: (f32, f32) = (5.0, 25.0);

/// Yaw jitter range every build uses, in degrees
pub const YAW_JITTER_DEG: (f32, f32) = (-45.0, 45.0);

/// Parameters for one plant
///
/// Missing TOML keys take their `Default` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantSettings {
    pub seed: u64,

    // Geometry
    pub radial_segments: u32,
    /// Spline samples per control span, also the tube rings per span
    pub curve_samples: u32,
    pub trunk_height: f32,
    pub trunk_radius: f32,
    /// Control-point count and wobble of the trunk path
    pub trunk_curviness: f32,

    // Branching
    /// Depth of the tree; 1 means a bare trunk
    pub branch_orders: u32,
    pub branches_per_order: u32,
    pub branches_per_order_decay: f32,
    /// Child length as a fraction of the parent, drawn uniformly
    pub child_length_scale: (f32, f32),
    pub child_radius_scale: f32,
    pub length_decay_per_order: f32,
    pub tip_branch_chance: f32,

    // Orientation
    /// Accepted for compatibility; builds use `PITCH_RANGE_DEG`
    pub pitch_range_deg: (f32, f32),
    /// Accepted for compatibility; builds use `YAW_JITTER_DEG`
    pub yaw_jitter_deg: (f32, f32),
    /// Orientation bias along the parent, 0..1
    pub bias: Curve,
    /// Radius multiplier from base to tip
    pub taper: RadiusProfile,
    /// Path wobble relative to segment length
    pub noise_amp: f32,

    // Floors
    pub min_radius: f32,
    pub min_length: f32,

    // Ratios (0 means derive from the floors)
    pub max_child_to_parent_ratio: f32,
    pub tip_thin_power: f32,
    pub abs_min_twig_radius: f32,
    pub stop_branch_radius: f32,

    // Growth habit
    pub upward_branch_chance: f32,
    pub upward_lift: f32,
    pub plagiotropic_chance: f32,
    pub canopy_plagiotropic_boost: f32,
    pub horizontal_pitch_range_deg: (f32, f32),
    pub reduce_up_bias_in_curve: f32,

    pub last_order_len_factor: f32,
    pub near_last_order_len_factor: f32,

    /// Colour each branch mesh by its order
    pub debug_order_tint: bool,
}

impl Default for PlantSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            radial_segments: 12,
            curve_samples: 16,
            trunk_height: 8.0,
            trunk_radius: 0.14,
            trunk_curviness: 0.12,
            branch_orders: 4,
            branches_per_order: 8,
            branches_per_order_decay: 0.95,
            child_length_scale: (0.65, 0.9),
            child_radius_scale: 0.65,
            length_decay_per_order: 0.88,
            tip_branch_chance: 0.8,
            pitch_range_deg: PITCH_RANGE_DEG,
            yaw_jitter_deg: YAW_JITTER_DEG,
            bias: orthotropic_bias(),
            taper: default_taper(),
            noise_amp: 0.06,
            min_radius: 0.008,
            min_length: 0.28,
            max_child_to_parent_ratio: 0.6,
            tip_thin_power: 1.2,
            abs_min_twig_radius: 0.0,
            stop_branch_radius: 0.0,
            upward_branch_chance: 0.15,
            upward_lift: 0.06,
            plagiotropic_chance: 0.85,
            canopy_plagiotropic_boost: 0.45,
            horizontal_pitch_range_deg: (5.0, 35.0),
            reduce_up_bias_in_curve: 0.3,
            last_order_len_factor: 0.65,
            near_last_order_len_factor: 0.85,
            debug_order_tint: false,
        }
    }
}

/// Bias for upright growers: branches near the tip follow the up-pitch draw
pub fn orthotropic_bias() -> Curve {
    Curve::ease_in_out(0.0, 0.6, 1.0, 1.0)
}

/// Bias for spreading growers
pub fn plagiotropic_bias() -> Curve {
    Curve::ease_in_out(0.0, 0.2, 1.0, 0.6)
}

/// Linear-ish falloff from full radius to a fifth at the tip
pub fn default_taper() -> RadiusProfile {
    Curve::from_points(&[(0.0, 1.0), (1.0, 0.2)])
}

impl PlantSettings {
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

    /// Normalize into the values a build actually uses
    pub fn resolve(&self) -> ResolvedSettings {
        let mut s = self.clone();

        if s.branch_orders == 0 {
            warn!("branch_orders is 0, building a bare trunk");
            s.branch_orders = 1;
        }
        if s.curve_samples == 0 {
            warn!("curve_samples is 0, using 1");
            s.curve_samples = 1;
        }
        s.trunk_height = fallback("trunk_height", s.trunk_height, s.trunk_height > 0.0, 8.0);
        s.trunk_radius = fallback("trunk_radius", s.trunk_radius, s.trunk_radius > 0.0, 0.14);
        s.min_radius = fallback("min_radius", s.min_radius, s.min_radius >= 0.0, 0.008);
        s.min_length = fallback("min_length", s.min_length, s.min_length >= 0.0, 0.28);
        if s.child_length_scale.0 > s.child_length_scale.1 {
            s.child_length_scale = (s.child_length_scale.1, s.child_length_scale.0);
        }

        s.max_child_to_parent_ratio = fallback(
            "max_child_to_parent_ratio",
            s.max_child_to_parent_ratio,
            s.max_child_to_parent_ratio > 0.0 && s.max_child_to_parent_ratio < 1.0,
            0.6,
        );
        s.tip_thin_power = fallback("tip_thin_power", s.tip_thin_power, s.tip_thin_power > 0.0, 1.2);

        // Derived floors: zero is the normal way to ask for them
        if s.abs_min_twig_radius <= 0.0 {
            s.abs_min_twig_radius = (s.min_radius * 0.25).max(0.0005);
        }
        if s.stop_branch_radius <= 0.0 {
            s.stop_branch_radius = (s.abs_min_twig_radius * 1.5).max(s.min_radius * 0.9);
        }

        s.upward_branch_chance = chance("upward_branch_chance", s.upward_branch_chance, 0.15);
        s.upward_lift = chance("upward_lift", s.upward_lift, 0.06);
        s.plagiotropic_chance = chance("plagiotropic_chance", s.plagiotropic_chance, 0.85);
        s.canopy_plagiotropic_boost =
            chance("canopy_plagiotropic_boost", s.canopy_plagiotropic_boost, 0.45);
        s.reduce_up_bias_in_curve =
            chance("reduce_up_bias_in_curve", s.reduce_up_bias_in_curve, 0.3);
        if s.horizontal_pitch_range_deg == (0.0, 0.0) {
            warn!("horizontal_pitch_range_deg is empty, using 5..35");
            s.horizontal_pitch_range_deg = (5.0, 35.0);
        }

        if s.pitch_range_deg != PITCH_RANGE_DEG {
            warn!(
                requested = ?s.pitch_range_deg,
                used = ?PITCH_RANGE_DEG,
                "pitch_range_deg is fixed, ignoring requested range"
            );
        }
        if s.yaw_jitter_deg != YAW_JITTER_DEG {
            warn!(
                requested = ?s.yaw_jitter_deg,
                used = ?YAW_JITTER_DEG,
                "yaw_jitter_deg is fixed, ignoring requested range"
            );
        }
        s.pitch_range_deg = PITCH_RANGE_DEG;
        s.yaw_jitter_deg = YAW_JITTER_DEG;

        s.last_order_len_factor = fallback(
            "last_order_len_factor",
            s.last_order_len_factor,
            s.last_order_len_factor > 0.0 && s.last_order_len_factor < 1.0,
            0.65,
        );
        s.near_last_order_len_factor = fallback(
            "near_last_order_len_factor",
            s.near_last_order_len_factor,
            s.near_last_order_len_factor > 0.0 && s.near_last_order_len_factor < 1.0,
            0.85,
        );
        s.length_decay_per_order = fallback(
            "length_decay_per_order",
            s.length_decay_per_order,
            s.length_decay_per_order > 0.0 && s.length_decay_per_order <= 1.0,
            0.8,
        );

        ResolvedSettings(s)
    }
}

fn fallback(name: &str, value: f32, valid: bool, default: f32) -> f32 {
    if valid {
        value
    } else {
        warn!(setting = name, value, default, "setting out of range, using default");
        default
    }
}

/// Probability-like value: non-positive takes the default, the rest is clamped to 0..1
fn chance(name: &str, value: f32, default: f32) -> f32 {
    fallback(name, value, value > 0.0, default).clamp(0.0, 1.0)
}

/// Settings after normalization
///
/// Derefs to the normalized `PlantSettings`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings(PlantSettings);

impl Deref for ResolvedSettings {
    type Target = PlantSettings;

    fn deref(&self) -> &PlantSettings {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================================
    // Defaults and normalization
    // =============================================================

    #[test]
    fn test_defaults_resolve_unchanged() {
        let settings = PlantSettings::default();
        let resolved = settings.resolve();
        assert_eq!(resolved.branch_orders, 4);
        assert_eq!(resolved.pitch_range_deg, PITCH_RANGE_DEG);
        assert!((resolved.upward_branch_chance - 0.15).abs() < f32::EPSILON);
        assert!((resolved.length_decay_per_order - 0.88).abs() < f32::EPSILON);
    }

    #[test]
    fn test_derived_floors() {
        let resolved = PlantSettings::default().resolve();
        // min_radius 0.008: abs = max(0.0005, 0.002), stop = max(0.003, 0.0072)
        assert!((resolved.abs_min_twig_radius - 0.002).abs() < 1e-7);
        assert!((resolved.stop_branch_radius - 0.0072).abs() < 1e-7);

        let tiny = PlantSettings {
            min_radius: 0.0,
            ..Default::default()
        }
        .resolve();
        assert!((tiny.abs_min_twig_radius - 0.0005).abs() < 1e-7);
        assert!((tiny.stop_branch_radius - 0.00075).abs() < 1e-7);
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let settings = PlantSettings {
            max_child_to_parent_ratio: 1.5,
            tip_thin_power: -1.0,
            upward_branch_chance: 0.0,
            plagiotropic_chance: 3.0,
            horizontal_pitch_range_deg: (0.0, 0.0),
            last_order_len_factor: 1.0,
            near_last_order_len_factor: 0.0,
            length_decay_per_order: 1.2,
            branch_orders: 0,
            curve_samples: 0,
            ..Default::default()
        };
        let r = settings.resolve();
        assert_eq!(r.max_child_to_parent_ratio, 0.6);
        assert_eq!(r.tip_thin_power, 1.2);
        assert_eq!(r.upward_branch_chance, 0.15);
        assert_eq!(r.plagiotropic_chance, 1.0);
        assert_eq!(r.horizontal_pitch_range_deg, (5.0, 35.0));
        assert_eq!(r.last_order_len_factor, 0.65);
        assert_eq!(r.near_last_order_len_factor, 0.85);
        assert_eq!(r.length_decay_per_order, 0.8);
        assert_eq!(r.branch_orders, 1);
        assert_eq!(r.curve_samples, 1);
    }

    #[test]
    fn test_non_positive_sizes_fall_back() {
        let settings = PlantSettings {
            trunk_radius: -0.5,
            trunk_height: -3.0,
            min_radius: -1.0,
            min_length: f32::NAN,
            ..Default::default()
        };
        let r = settings.resolve();
        assert_eq!(r.trunk_radius, 0.14);
        assert_eq!(r.trunk_height, 8.0);
        assert_eq!(r.min_radius, 0.008);
        assert_eq!(r.min_length, 0.28);

        // Zero floors are allowed
        let zero = PlantSettings {
            min_radius: 0.0,
            min_length: 0.0,
            trunk_radius: 0.0,
            ..Default::default()
        }
        .resolve();
        assert_eq!(zero.min_radius, 0.0);
        assert_eq!(zero.min_length, 0.0);
        assert_eq!(zero.trunk_radius, 0.14);
    }

    #[test]
    fn test_orientation_ranges_are_pinned() {
        let settings = PlantSettings {
            pitch_range_deg: (15.0, 40.0),
            yaw_jitter_deg: (-20.0, 20.0),
            ..Default::default()
        };
        let r = settings.resolve();
        assert_eq!(r.pitch_range_deg, PITCH_RANGE_DEG);
        assert_eq!(r.yaw_jitter_deg, YAW_JITTER_DEG);
    }

    // =============================================================
    // TOML
    // =============================================================

    #[test]
    fn test_empty_toml_is_default() {
        let settings = PlantSettings::from_toml_str("").unwrap();
        assert_eq!(settings, PlantSettings::default());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            seed = 7
            branch_orders = 2
            child_length_scale = [0.5, 0.7]

            [[taper]]
            time = 0.0
            value = 1.0

            [[taper]]
            time = 1.0
            value = 0.5
        "#;
        let settings = PlantSettings::from_toml_str(text).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.branch_orders, 2);
        assert_eq!(settings.child_length_scale, (0.5, 0.7));
        assert!((settings.taper.evaluate(1.0) - 0.5).abs() < 1e-6);
        assert_eq!(settings.trunk_height, 8.0);
        assert_eq!(settings.bias, orthotropic_bias());
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = PlantSettings {
            seed: 1234,
            bias: plagiotropic_bias(),
            debug_order_tint: true,
            ..Default::default()
        };
        let text = settings.to_toml_string().unwrap();
        let parsed = PlantSettings::from_toml_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = PlantSettings::from_toml_str("branch_orders = \"many\"").unwrap_err();
        assert!(matches!(err, PlantError::Config(_)));
    }
}
