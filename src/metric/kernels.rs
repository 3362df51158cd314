//! Energy, position and angular kernels.
//!
//! Each kernel mutates the particle in place and returns its anomaly
//! signal (always zero for now).

use std::f64::consts::PI;

use tracing::warn;

use crate::constants::{DEG_TO_RAD, E_MAX, E_MIN, MAX_RESAMPLES};
use crate::stochastic::{isotropic_direction, Deviates};
use crate::types::{Particle, Vec3};

/// Kick width of coordinate `i`; an unscaled coordinate stays fixed even at infinite bandwidth
#[inline]
pub(super) fn sigma(scaling: &[f32], i: usize, bw: f64) -> f64 {
    if scaling[i] == 0.0 {
        0.0
    } else {
        bw * f64::from(scaling[i])
    }
}

#[inline]
fn clamp_energy(e: f64) -> f64 {
    // NaN falls to E_MIN
    if !(e >= E_MIN) {
        E_MIN
    } else if e > E_MAX {
        E_MAX
    } else {
        e
    }
}

pub(crate) fn energy<D: Deviates + ?Sized>(scaling: &[f32], part: &mut Particle, bw: f64, rng: &mut D) -> usize {
    part.ekin = clamp_energy(part.ekin + sigma(scaling, 0, bw) * rng.normal());
    0
}

pub(crate) fn lethargy<D: Deviates + ?Sized>(scaling: &[f32], part: &mut Particle, bw: f64, rng: &mut D) -> usize {
    part.ekin = clamp_energy(part.ekin * (sigma(scaling, 0, bw) * rng.normal()).exp());
    0
}

/// Volume (three bounds) and SurfaceXY (two bounds) share this kernel
///
/// All kicks are drawn before clamping, axis by axis in x, y, z order.
pub(crate) fn bounded_position<D: Deviates + ?Sized>(
    scaling: &[f32],
    bounds: &[[f64; 2]],
    part: &mut Particle,
    bw: f64,
    rng: &mut D,
) -> usize {
    let mut pos = part.position.to_array();
    for (axis, coord) in pos.iter_mut().enumerate().take(bounds.len()) {
        *coord += sigma(scaling, axis, bw) * rng.normal();
    }
    for (coord, &[min, max]) in pos.iter_mut().zip(bounds) {
        if !(*coord >= min) {
            *coord = min;
        } else if *coord > max {
            *coord = max;
        }
    }
    part.position = Vec3::from_array(pos);
    0
}

/// Result of a sign-preserving polar angle draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarDraw {
    /// Sampled polar angle (rad)
    pub theta: f64,
    /// Number of draws taken, initial draw included
    pub attempts: usize,
    /// Whether `cos θ` kept the sign of `cos θ0`
    pub accepted: bool,
}

/// Draw `θ = θ0 + σ·N` without flipping the sign of `cos θ`
///
/// Redraws up to [`MAX_RESAMPLES`] times. When the budget runs out the last
/// draw is kept and a warning is logged.
pub fn resample_polar<D: Deviates + ?Sized>(theta0: f64, sigma: f64, rng: &mut D) -> PolarDraw {
    let flips = |theta: f64| theta0.cos() * theta.cos() < 0.0;

    let mut theta = theta0 + sigma * rng.normal();
    let mut attempts = 1;
    while flips(theta) && attempts <= MAX_RESAMPLES {
        theta = theta0 + sigma * rng.normal();
        attempts += 1;
    }
    let accepted = !flips(theta);
    if !accepted {
        warn!(theta0, theta, attempts, "polar resampling budget exhausted, keeping last draw");
    }
    PolarDraw {
        theta,
        attempts,
        accepted,
    }
}

/// Full-sphere resampling for `s = ∞`, exponential tilt about the current
/// direction for finite `s > 0`, untouched otherwise
pub(crate) fn isotropic<D: Deviates + ?Sized>(scaling: &[f32], part: &mut Particle, bw: f64, rng: &mut D) -> usize {
    let s = sigma(scaling, 0, bw);
    if s == f64::INFINITY {
        part.direction = isotropic_direction(rng);
    } else if s > 0.0 {
        let s2 = s * s;
        let xi = rng.uniform();
        let w = (1.0 + s2 * (xi + (1.0 - xi) * (-2.0 / s2).exp()).ln()).clamp(-1.0, 1.0);
        let phi = 2.0 * PI * rng.uniform();
        let uv = (1.0 - w * w).sqrt();
        let (u, v) = (uv * phi.cos(), uv * phi.sin());

        let Vec3 { x, y, z } = part.direction;
        let cross = v * x - u * y;
        // Frame built from the pole nearest to the current direction
        let (dx, dy) = if z > 0.0 {
            (u * z + w * x - cross * y / (1.0 + z), v * z + w * y + cross * x / (1.0 + z))
        } else {
            (u * z + w * x + cross * y / (1.0 - z), v * z + w * y - cross * x / (1.0 - z))
        };
        part.direction = Vec3::new(dx, dy, w * z - u * x - v * y);
    }
    0
}

pub(crate) fn polar<D: Deviates + ?Sized>(scaling: &[f32], part: &mut Particle, bw: f64, rng: &mut D) -> usize {
    let d = part.direction;
    let theta0 = d.z.clamp(-1.0, 1.0).acos();
    let mut phi = d.y.atan2(d.x);

    let theta = resample_polar(theta0, sigma(scaling, 0, bw) * DEG_TO_RAD, rng).theta;
    phi += sigma(scaling, 1, bw) * DEG_TO_RAD * rng.normal();

    part.direction = Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
    0
}
