//! Color utilities for bark and leaf tinting
//!
//! Colors are linear `[r, g, b]` triples in 0..1. Hue is expressed as a
//! 0..1 fraction of the color wheel.

use serde::{Deserialize, Serialize};

pub type Rgb = [f32; 3];

/// RGB to HSV conversion
#[inline]
pub fn rgb_to_hsv(rgb: Rgb) -> (f32, f32, f32) {
    let [r, g, b] = rgb;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };

    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h / 360.0, s, max)
}

/// HSV to RGB conversion
#[inline]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 360.0;

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m]
}

#[inline]
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// A color stop in a gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    pub time: f32,
    pub color: Rgb,
}

/// Piecewise-linear color ramp, clamped at both ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ColorKey>", into = "Vec<ColorKey>")]
pub struct Gradient {
    keys: Vec<ColorKey>,
}

impl Gradient {
    pub fn new(mut keys: Vec<ColorKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn from_stops(stops: &[(f32, Rgb)]) -> Self {
        Self::new(
            stops
                .iter()
                .map(|&(time, color)| ColorKey { time, color })
                .collect(),
        )
    }

    pub fn solid(color: Rgb) -> Self {
        Self::from_stops(&[(0.0, color)])
    }

    /// Sample the gradient; an empty gradient is white
    pub fn evaluate(&self, t: f32) -> Rgb {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return [1.0, 1.0, 1.0],
        };

        if t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }

        let next = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];
        let span = k1.time - k0.time;
        if span <= f32::EPSILON {
            return k1.color;
        }
        lerp_rgb(k0.color, k1.color, (t - k0.time) / span)
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::solid([1.0, 1.0, 1.0])
    }
}

impl From<Vec<ColorKey>> for Gradient {
    fn from(keys: Vec<ColorKey>) -> Self {
        Self::new(keys)
    }
}

impl From<Gradient> for Vec<ColorKey> {
    fn from(gradient: Gradient) -> Self {
        gradient.keys
    }
}

/// Debug tint for a branch order, trunk first
pub fn order_color(order: u32) -> Rgb {
    const PALETTE: [Rgb; 7] = [
        [0.45, 0.30, 0.12],
        [0.90, 0.55, 0.15],
        [0.95, 0.90, 0.20],
        [0.20, 0.75, 0.35],
        [0.20, 0.80, 0.80],
        [0.25, 0.45, 0.95],
        [0.70, 0.40, 0.90],
    ];
    PALETTE[(order as usize).min(PALETTE.len() - 1)]
}
