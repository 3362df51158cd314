//! # Stochastic Module
//!
//! Random deviate sources for the smearing kernels.
//!
//! Every kernel draws its deviates from an explicit [`Deviates`]
//! implementation passed in by the caller, so a seeded generator makes a
//! whole smearing run reproducible and each worker can own its own stream.
//!
//! ## Generators
//!
//! - [`RandomGenerator`]: xoshiro256** with SplitMix64 seeding
//! - [`RngDeviates`]: adapter over any `rand::Rng`
//!
//! ## References
//!
//! [1] Blackman & Vigna, "Scrambled linear pseudorandom number generators", 2018
//! [2] Box & Muller, "A note on the generation of random normal deviates", 1958

use std::f64::consts::PI;

use rand::Rng;

use crate::types::Vec3;

/// Source of uniform and standard-normal deviates
pub trait Deviates {
    /// Uniform deviate in [0, 1)
    fn uniform(&mut self) -> f64;

    /// Standard normal N(0, 1) deviate (Box-Muller)
    fn normal(&mut self) -> f64 {
        let u1 = self.uniform().max(1e-300);  // Avoid log(0)
        let u2 = self.uniform();

        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl<D: Deviates + ?Sized> Deviates for &mut D {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }

    fn normal(&mut self) -> f64 {
        (**self).normal()
    }
}

/// Pseudo-random number generator (xoshiro256**)
///
/// Fast, high-quality PRNG suitable for Monte Carlo simulations.
/// Period: 2^256 - 1
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    state: [u64; 4],
}

impl RandomGenerator {
    /// Create new RNG with seed
    pub fn new(seed: u64) -> Self {
        // Initialize state using SplitMix64
        let mut s = seed;
        let mut state = [0u64; 4];
        for slot in state.iter_mut() {
            s = s.wrapping_add(0x9e3779b97f4a7c15);
            let mut z = s;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            *slot = z ^ (z >> 31);
        }
        Self { state }
    }

    /// Independent stream for worker `index`, derived from a base seed
    pub fn for_worker(seed: u64, index: u64) -> Self {
        Self::new(seed ^ index.wrapping_add(1).wrapping_mul(0xd1b54a32d192ed03))
    }

    /// Generate next u64
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);

        result
    }
}

impl Deviates for RandomGenerator {
    #[inline]
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(42)  // Reproducible default
    }
}

/// Adapter exposing any `rand` generator as a [`Deviates`] source
#[derive(Debug, Clone)]
pub struct RngDeviates<R>(pub R);

impl<R: Rng> Deviates for RngDeviates<R> {
    fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Uniform direction on the unit sphere
///
/// cos θ uniform in [-1, 1], azimuth uniform in [0, 2π).
pub fn isotropic_direction<D: Deviates + ?Sized>(rng: &mut D) -> Vec3 {
    let mu = -1.0 + 2.0 * rng.uniform();
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    let phi = 2.0 * PI * rng.uniform();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), mu)
}

/// Replays fixed deviates; falls back to zero once the script runs out
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedDeviates {
    pub uniforms: std::collections::VecDeque<f64>,
    pub normals: std::collections::VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedDeviates {
    pub fn normals(values: &[f64]) -> Self {
        Self {
            uniforms: Default::default(),
            normals: values.iter().copied().collect(),
        }
    }

    pub fn uniforms(values: &[f64]) -> Self {
        Self {
            uniforms: values.iter().copied().collect(),
            normals: Default::default(),
        }
    }
}

#[cfg(test)]
impl Deviates for ScriptedDeviates {
    fn uniform(&mut self) -> f64 {
        self.uniforms.pop_front().unwrap_or(0.0)
    }

    fn normal(&mut self) -> f64 {
        self.normals.pop_front().unwrap_or(0.0)
    }
}
