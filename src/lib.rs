//! # KSMEAR-RS
//!
//! Kernel smearing of Monte Carlo particle phase-space records
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          KSMEAR-RS                                          │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  config    : TOML description ──build──▶ Geometry                          │
//! │  geometry  : placement + bandwidth stream + ordered metrics                 │
//! │  metric    : one kernel over a subset of (x, y, z, dx, dy, dz, E)           │
//! │  smear     : batch drivers (sequential, rayon chunks)                       │
//! │  stochastic: uniform/normal deviates, xoshiro256** generator               │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kernels
//!
//! | Kernel       | Coordinates              | Constraint                    |
//! |--------------|--------------------------|-------------------------------|
//! | Energy       | E                        | clamped to [E_MIN, E_MAX]     |
//! | Lethargy     | ln E                     | clamped to [E_MIN, E_MAX]     |
//! | Volume       | x, y, z                  | clamped to a box              |
//! | SurfaceXY    | x, y                     | clamped to a rectangle        |
//! | Guide        | z, t, θ, φ on a wall     | stays on the guide wall       |
//! | Isotropic    | direction                | unit norm                     |
//! | Polar        | θ, φ                     | cos θ keeps its sign          |

pub mod constants;
pub mod types;
pub mod error;
pub mod stochastic;
pub mod metric;
pub mod geometry;
pub mod config;
pub mod smear;

// Re-exports
pub use constants::*;
pub use types::{Particle, Vec3};
pub use error::{Result, SmearError};
pub use stochastic::{Deviates, RandomGenerator, RngDeviates};
pub use metric::{GuideShape, Kernel, KernelKind, Metric};
pub use geometry::{BandwidthSource, Geometry, RigidTransform};
pub use config::{GeometryConfig, MetricConfig};
pub use smear::{smear, smear_parallel};

/// KSMEAR version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Information about the library
pub fn info() -> String {
    format!(
        "KSMEAR-RS v{}\n\
         Kernel smearing of Monte Carlo particle phase-space records\n\
         Kernels: energy, lethargy, volume, surface-xy, guide, isotropic, polar",
        VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info() {
        let info = info();
        assert!(info.contains("KSMEAR-RS"));
        assert!(info.contains(VERSION));
    }
}
