//! # Metric Module
//!
//! A metric binds one smearing kernel to a subspace of particle phase
//! space: energy, lethargy, volume, a bounded XY surface, the walls of a
//! neutron guide, the full or biased solid angle, or the polar angle.
//!
//! ## Kernel Scales
//!
//! Every kernel kicks coordinate `i` with a deviate scaled by
//!
//! ```text
//! σ_i = bw · scaling[i]          (lengths, energies)
//! σ_i = bw · scaling[i] · π/180  (angles given in degrees)
//! ```
//!
//! where `bw` is the geometry bandwidth of the current event.

pub mod guide;
mod kernels;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmearError};
use crate::stochastic::Deviates;
use crate::types::Particle;

pub use guide::{GuideCoords, GuideShape, Mirror};
pub use kernels::{resample_polar, PolarDraw};

/// Kernel family, without shape parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelKind {
    Energy,
    Lethargy,
    Volume,
    #[serde(rename = "surface-xy")]
    SurfaceXY,
    Guide,
    Isotropic,
    Polar,
}

impl KernelKind {
    /// Number of shape parameters the kind expects
    pub fn n_params(&self) -> usize {
        match self {
            KernelKind::Volume => 6,
            KernelKind::SurfaceXY => 4,
            KernelKind::Guide => 4,
            _ => 0,
        }
    }
}

/// Smearing kernel with the shape parameters it uses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// Additive Gaussian on kinetic energy
    Energy,
    /// Log-normal (multiplicative) kick on kinetic energy
    Lethargy,
    /// Additive Gaussian on x, y, z, clamped to `[min, max]` per axis
    Volume { bounds: [[f64; 2]; 3] },
    /// Additive Gaussian on x, y, clamped to `[min, max]` per axis
    SurfaceXY { bounds: [[f64; 2]; 2] },
    /// Position and direction over the walls of a rectangular guide
    Guide(GuideShape),
    /// Full-sphere or forward-biased resampling of direction
    Isotropic,
    /// Polar and azimuthal angle kicks of direction
    Polar,
}

impl Kernel {
    /// Build a kernel from its kind and a flat parameter list
    ///
    /// Volume expects `[xmin, xmax, ymin, ymax, zmin, zmax]`, SurfaceXY
    /// `[xmin, xmax, ymin, ymax]` and Guide `[xwidth, yheight, zmax, rcurv]`.
    pub fn from_params(kind: KernelKind, params: &[f64]) -> Result<Self> {
        if params.len() != kind.n_params() {
            return Err(SmearError::InvalidMetric(format!(
                "{:?} expects {} parameters, got {}",
                kind,
                kind.n_params(),
                params.len()
            )));
        }
        let kernel = match kind {
            KernelKind::Energy => Kernel::Energy,
            KernelKind::Lethargy => Kernel::Lethargy,
            KernelKind::Volume => Kernel::Volume {
                bounds: [
                    [params[0], params[1]],
                    [params[2], params[3]],
                    [params[4], params[5]],
                ],
            },
            KernelKind::SurfaceXY => Kernel::SurfaceXY {
                bounds: [[params[0], params[1]], [params[2], params[3]]],
            },
            KernelKind::Guide => Kernel::Guide(GuideShape {
                xwidth: params[0],
                yheight: params[1],
                zmax: params[2],
                rcurv: params[3],
            }),
            KernelKind::Isotropic => Kernel::Isotropic,
            KernelKind::Polar => Kernel::Polar,
        };
        kernel.validate()?;
        Ok(kernel)
    }

    pub fn kind(&self) -> KernelKind {
        match self {
            Kernel::Energy => KernelKind::Energy,
            Kernel::Lethargy => KernelKind::Lethargy,
            Kernel::Volume { .. } => KernelKind::Volume,
            Kernel::SurfaceXY { .. } => KernelKind::SurfaceXY,
            Kernel::Guide(_) => KernelKind::Guide,
            Kernel::Isotropic => KernelKind::Isotropic,
            Kernel::Polar => KernelKind::Polar,
        }
    }

    /// Flat parameter list, inverse of [`Kernel::from_params`]
    pub fn params(&self) -> Vec<f64> {
        match self {
            Kernel::Volume { bounds } => bounds.iter().flatten().copied().collect(),
            Kernel::SurfaceXY { bounds } => bounds.iter().flatten().copied().collect(),
            Kernel::Guide(g) => vec![g.xwidth, g.yheight, g.zmax, g.rcurv],
            _ => Vec::new(),
        }
    }

    /// Number of scaling factors the kernel reads
    pub fn default_dimension(&self) -> usize {
        match self {
            Kernel::Energy | Kernel::Lethargy | Kernel::Isotropic => 1,
            Kernel::Volume { .. } => 3,
            Kernel::SurfaceXY { .. } | Kernel::Polar => 2,
            Kernel::Guide(_) => 4,
        }
    }

    /// Names and units of the smeared coordinates
    pub fn variables(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Kernel::Energy => &[("E", "MeV")],
            Kernel::Lethargy => &[("u", "")],
            Kernel::Volume { .. } => &[("x", "cm"), ("y", "cm"), ("z", "cm")],
            Kernel::SurfaceXY { .. } => &[("x", "cm"), ("y", "cm")],
            Kernel::Guide(_) => &[("z", "cm"), ("t", "cm"), ("theta", "deg"), ("phi", "deg")],
            Kernel::Isotropic => &[("dx", ""), ("dy", ""), ("dz", "")],
            Kernel::Polar => &[("theta", "deg"), ("phi", "deg")],
        }
    }

    fn validate(&self) -> Result<()> {
        let bounds: &[[f64; 2]] = match self {
            Kernel::Volume { bounds } => &bounds[..],
            Kernel::SurfaceXY { bounds } => &bounds[..],
            Kernel::Guide(shape) => return shape.validate(),
            _ => return Ok(()),
        };
        for (axis, [min, max]) in bounds.iter().enumerate() {
            // Also rejects NaN bounds
            if !(min <= max) {
                return Err(SmearError::InvalidMetric(format!(
                    "axis {} bounds [{}, {}] are not ordered",
                    axis, min, max
                )));
            }
        }
        Ok(())
    }
}

/// One smearing kernel with its per-coordinate scaling
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    dimension: usize,
    scaling: Vec<f32>,
    kernel: Kernel,
}

impl Metric {
    /// Create a metric
    ///
    /// `scaling` defaults to all zeros; when given it must hold exactly
    /// `dimension` entries. Values are stored in single precision.
    pub fn new(dimension: usize, scaling: Option<&[f64]>, kernel: Kernel) -> Result<Self> {
        kernel.validate()?;
        if dimension < kernel.default_dimension() {
            return Err(SmearError::InvalidMetric(format!(
                "{:?} kernel needs dimension {}, got {}",
                kernel.kind(),
                kernel.default_dimension(),
                dimension
            )));
        }
        let scaling = match scaling {
            Some(s) if s.len() != dimension => {
                return Err(SmearError::InvalidMetric(format!(
                    "scaling has {} entries for dimension {}",
                    s.len(),
                    dimension
                )));
            }
            Some(s) => s.iter().map(|&v| v as f32).collect(),
            None => vec![0.0; dimension],
        };
        Ok(Self {
            dimension,
            scaling,
            kernel,
        })
    }

    /// Create a metric of the kernel's natural dimension
    pub fn with_scaling(kernel: Kernel, scaling: &[f64]) -> Result<Self> {
        Self::new(kernel.default_dimension(), Some(scaling), kernel)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn scaling(&self) -> &[f32] {
        &self.scaling
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Smear `particle` in place with bandwidth `bw`
    ///
    /// Returns the kernel's anomaly signal; zero means none.
    pub fn perturb<D: Deviates + ?Sized>(&self, particle: &mut Particle, bw: f64, rng: &mut D) -> usize {
        let s = &self.scaling;
        match &self.kernel {
            Kernel::Energy => kernels::energy(s, particle, bw, rng),
            Kernel::Lethargy => kernels::lethargy(s, particle, bw, rng),
            Kernel::Volume { bounds } => kernels::bounded_position(s, bounds, particle, bw, rng),
            Kernel::SurfaceXY { bounds } => kernels::bounded_position(s, bounds, particle, bw, rng),
            Kernel::Guide(shape) => guide::perturb(shape, s, particle, bw, rng),
            Kernel::Isotropic => kernels::isotropic(s, particle, bw, rng),
            Kernel::Polar => kernels::polar(s, particle, bw, rng),
        }
    }

    /// Density correction of the kernel's coordinates at `particle`
    ///
    /// Lethargy contributes `1/E`; a biased isotropic kernel of width
    /// `s = bw·scaling[0]` contributes `√(2π)·s / (1 − exp(−2/s²))`.
    pub fn jacobian(&self, particle: &Particle, bw: f64) -> f64 {
        match self.kernel {
            Kernel::Lethargy => 1.0 / particle.ekin,
            Kernel::Isotropic => {
                let s = kernels::sigma(&self.scaling, 0, bw);
                if s.is_finite() && s > 0.0 {
                    (2.0 * std::f64::consts::PI).sqrt() * s / (1.0 - (-2.0 / (s * s)).exp())
                } else {
                    1.0
                }
            }
            _ => 1.0,
        }
    }
}
