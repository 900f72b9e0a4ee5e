// silboard_core/src/noise.rs

use nalgebra::Vector3;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use std::ops::Add;

use crate::abstractions::NoiseSource;

// =========================================================================
// == Noise Engine ==
// =========================================================================

/// A seeded pseudo-random generator owned by one board for its whole lifetime.
///
/// `ChaCha8Rng` by default; any `RngCore` can be plugged in with `with_rng`.
#[derive(Debug, Clone)]
pub struct NoiseEngine<R: RngCore = ChaCha8Rng> {
    rng: R,
    unit_interval: Uniform<f64>,
}

impl NoiseEngine<ChaCha8Rng> {
    /// A reproducible engine: the same seed yields the same sample sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// An engine seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    pub fn from_seed_or_entropy(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: RngCore> NoiseEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            unit_interval: Uniform::new(-1.0, 1.0),
        }
    }
}

impl<R: RngCore + Send> NoiseSource for NoiseEngine<R> {
    fn gaussian(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    fn uniform(&mut self) -> f64 {
        self.unit_interval.sample(&mut self.rng)
    }
}

/// Initial bias draw: `range * U(-1, 1)`.
pub fn init_bias(range: f64, noise: &mut dyn NoiseSource) -> f64 {
    range * noise.uniform()
}

/// One random-walk step: `bias + stdev * N(0, 1)`.
pub fn walk(bias: f64, stdev: f64, noise: &mut dyn NoiseSource) -> f64 {
    bias + stdev * noise.gaussian()
}

// =========================================================================
// == Bias State ==
// =========================================================================

/// Anything a bias can be: a scalar or a per-axis vector.
pub trait BiasAxes: Copy + Add<Output = Self> {
    fn zero() -> Self;
    /// Builds a value by calling `f` once per axis, in x, y, z order.
    fn from_fn(f: impl FnMut() -> f64) -> Self;
}

impl BiasAxes for f64 {
    fn zero() -> Self {
        0.0
    }

    fn from_fn(mut f: impl FnMut() -> f64) -> Self {
        f()
    }
}

impl BiasAxes for Vector3<f64> {
    fn zero() -> Self {
        Vector3::zeros()
    }

    fn from_fn(mut f: impl FnMut() -> f64) -> Self {
        let x = f();
        let y = f();
        let z = f();
        Vector3::new(x, y, z)
    }
}

/// A constant offset that drifts by a Gaussian increment on every read.
/// Never reset once initialized, except by an explicit re-initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasState<V> {
    value: V,
    /// Bound of the uniform initial draw.
    pub range: f64,
    /// Scale of the per-read Gaussian increment.
    pub walk_stdev: f64,
}

impl<V: BiasAxes> BiasState<V> {
    /// A zero bias. Call `initialize` before use.
    pub fn new(range: f64, walk_stdev: f64) -> Self {
        Self {
            value: V::zero(),
            range,
            walk_stdev,
        }
    }

    /// Draws the initial bias uniformly from `[-range, range]` on every axis.
    pub fn initialize(&mut self, noise: &mut dyn NoiseSource) {
        let range = self.range;
        self.value = V::from_fn(|| init_bias(range, &mut *noise));
    }

    /// Advances the random walk by one step and returns the new bias.
    pub fn walk(&mut self, noise: &mut dyn NoiseSource) -> V {
        let stdev = self.walk_stdev;
        let step = V::from_fn(|| walk(0.0, stdev, &mut *noise));
        self.value = self.value + step;
        self.value
    }

    pub fn value(&self) -> V {
        self.value
    }
}

/// One zero-mean Gaussian sample per axis, scaled by `stdev`.
pub fn gaussian_noise<V: BiasAxes>(stdev: f64, noise: &mut dyn NoiseSource) -> V {
    V::from_fn(|| stdev * noise.gaussian())
}
