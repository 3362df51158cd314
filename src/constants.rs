//! # Constants
//!
//! Energy limits, sampling budgets and unit conversions shared by the
//! smearing kernels. Energies are in MeV, lengths in cm.

use std::f64::consts::PI;

// ============================================================================
// ENERGY DOMAIN
// ============================================================================

/// Lowest kinetic energy a smeared particle may carry (MeV)
pub const E_MIN: f64 = 1e-11;

/// Highest kinetic energy a smeared particle may carry (MeV)
pub const E_MAX: f64 = 20.0;

// ============================================================================
// SAMPLING
// ============================================================================

/// Maximum redraws of a polar angle before accepting the last draw
pub const MAX_RESAMPLES: usize = 1000;

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Degrees to radians
pub const DEG_TO_RAD: f64 = PI / 180.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_window() {
        assert!(E_MIN > 0.0);
        assert!(E_MIN < E_MAX);
    }

    #[test]
    fn test_angle_conversion() {
        assert!((180.0 * DEG_TO_RAD - PI).abs() < 1e-15);
        assert!((90.0 * DEG_TO_RAD - PI / 2.0).abs() < 1e-15);
    }
}
