//! # Batch Smearing
//!
//! Drives a geometry over a slice of particles, one event per particle:
//! smear with the current bandwidth, then advance the bandwidth stream.
//!
//! The parallel driver never shares a geometry between threads. Each chunk
//! gets its own [`Geometry::try_clone`], positioned on the chunk's first
//! event, and its own generator derived from the base seed, so a run is
//! reproducible for a fixed seed and chunk size.

use rayon::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::geometry::Geometry;
use crate::stochastic::{Deviates, RandomGenerator};
use crate::types::Particle;

/// Smear every particle in order on the calling thread
///
/// Returns the summed anomaly signal.
pub fn smear<D: Deviates + ?Sized>(geometry: &mut Geometry, particles: &mut [Particle], rng: &mut D) -> Result<usize> {
    let mut signal = 0;
    for part in particles.iter_mut() {
        signal += geometry.perturb(part, rng);
        geometry.advance()?;
    }
    Ok(signal)
}

/// Smear particles in parallel chunks
///
/// Chunk `i` starts on bandwidth event `i * chunk_size` and draws from
/// `RandomGenerator::for_worker(seed, i)`.
pub fn smear_parallel(geometry: &Geometry, particles: &mut [Particle], chunk_size: usize, seed: u64) -> Result<usize> {
    let chunk_size = chunk_size.max(1);
    let n = particles.len();

    let signals = particles
        .par_chunks_mut(chunk_size)
        .enumerate()
        .map(|(i, chunk)| {
            let mut geom = geometry.try_clone()?;
            geom.seek_event((i * chunk_size) as u64)?;
            let mut rng = RandomGenerator::for_worker(seed, i as u64);
            smear(&mut geom, chunk, &mut rng)
        })
        .collect::<Result<Vec<usize>>>()?;

    let signal = signals.iter().sum();
    info!(particles = n, chunks = signals.len(), signal, "smearing finished");
    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{E_MAX, E_MIN};
    use crate::metric::{Kernel, Metric};
    use crate::types::Vec3;

    fn source() -> Vec<Particle> {
        (0..1000)
            .map(|i| Particle::new(Vec3::new(0.0, 0.0, i as f64 * 0.01), Vec3::unit_z(), 1.0 + i as f64 * 0.001))
            .collect()
    }

    fn geometry() -> Geometry {
        Geometry::with_bandwidth(
            vec![
                Metric::with_scaling(Kernel::Energy, &[2.0]).unwrap(),
                Metric::with_scaling(Kernel::Isotropic, &[0.3]).unwrap(),
            ],
            1.0,
        )
    }

    #[test]
    fn test_sequential_smear() {
        let mut geom = geometry();
        let mut parts = source();
        let mut rng = RandomGenerator::new(3);
        assert_eq!(smear(&mut geom, &mut parts, &mut rng).unwrap(), 0);
        assert!(parts.iter().all(|p| p.ekin >= E_MIN && p.ekin <= E_MAX));
        assert!(parts.iter().all(|p| (p.direction.mag() - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_parallel_reproducible() {
        let geom = geometry();
        let mut a = source();
        let mut b = source();
        smear_parallel(&geom, &mut a, 64, 17).unwrap();
        smear_parallel(&geom, &mut b, 64, 17).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.ekin >= E_MIN && p.ekin <= E_MAX));
    }

    #[test]
    fn test_parallel_matches_sequential_per_chunk() {
        let geom = geometry();
        let mut par = source();
        smear_parallel(&geom, &mut par, 250, 5).unwrap();

        let mut seq = source();
        for (i, chunk) in seq.chunks_mut(250).enumerate() {
            let mut g = geom.try_clone().unwrap();
            smear(&mut g, chunk, &mut RandomGenerator::for_worker(5, i as u64)).unwrap();
        }
        assert_eq!(par, seq);
    }
}
