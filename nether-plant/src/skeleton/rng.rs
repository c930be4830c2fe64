//! Seeded random stream for one skeleton build

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic random source threaded through the builder
///
/// Every draw advances one `Pcg32` stream, so the same seed and settings
/// always replay the same sequence of decisions.
pub struct BranchRng {
    inner: Pcg32,
}

impl BranchRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform in [0, 1)
    pub fn unit(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Uniform between `a` and `b`; the bounds may be given in either order
    pub fn range(&mut self, a: f32, b: f32) -> f32 {
        a + self.unit() * (b - a)
    }

    /// Uniform between the two ends of `range`
    pub fn range_of(&mut self, range: (f32, f32)) -> f32 {
        self.range(range.0, range.1)
    }

    /// Gaussian sample via Box-Muller, consuming two uniforms
    pub fn normal_around(&mut self, mean: f32, sigma: f32) -> f32 {
        let u1 = 1.0 - self.inner.random::<f64>();
        let u2 = 1.0 - self.inner.random::<f64>();
        let r = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).sin();
        mean + r as f32 * sigma
    }

    /// Shuffle `items` in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}
