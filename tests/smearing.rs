//! End-to-end smearing through the public API.

use std::f64::consts::PI;
use std::io::Write;

use ksmear_rs::{
    smear, smear_parallel, BandwidthSource, Geometry, GeometryConfig, Kernel, Metric, Particle,
    RandomGenerator, SmearError, Vec3, E_MAX, E_MIN,
};
use tempfile::NamedTempFile;

fn bandwidth_file(values: &[f32]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for v in values {
        file.write_all(&v.to_ne_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Largest gap between the empirical CDF of `samples` and the uniform CDF on [lo, hi]
fn ks_uniform(mut samples: Vec<f64>, lo: f64, hi: f64) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = samples.len() as f64;
    samples
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let cdf = (x - lo) / (hi - lo);
            (cdf - i as f64 / n).abs().max(((i + 1) as f64 / n - cdf).abs())
        })
        .fold(0.0, f64::max)
}

#[test]
fn test_isotropic_infinite_bandwidth_is_uniform_on_sphere() {
    let metric = Metric::with_scaling(Kernel::Isotropic, &[1.0]).unwrap();
    let geom = Geometry::with_bandwidth(vec![metric], f64::INFINITY);
    let mut rng = RandomGenerator::new(2024);

    let n = 20_000;
    let mut cos_theta = Vec::with_capacity(n);
    let mut azimuth = Vec::with_capacity(n);
    for _ in 0..n {
        let mut p = Particle::new(Vec3::zero(), Vec3::unit_z(), 1.0);
        geom.perturb(&mut p, &mut rng);
        assert!((p.direction.mag() - 1.0).abs() < 1e-9);
        cos_theta.push(p.direction.z);
        azimuth.push(p.direction.y.atan2(p.direction.x) + PI);
    }

    // 99.9% critical value of the one-sample KS statistic
    let critical = 1.95 / (n as f64).sqrt();
    assert!(ks_uniform(cos_theta, -1.0, 1.0) < critical);
    assert!(ks_uniform(azimuth, 0.0, 2.0 * PI) < critical);
}

#[test]
fn test_config_to_smeared_batch() {
    let text = r#"
bandwidth = 2.0
translation = [0.0, 0.0, 50.0]

[[metrics]]
kind = "lethargy"
scaling = [3.0]

[[metrics]]
kind = "volume"
scaling = [1.0, 1.0, 1.0]
params = [-2.0, 2.0, -2.0, 2.0, -1.0, 1.0]

[[metrics]]
kind = "polar"
scaling = [20.0, 20.0]
"#;
    let mut geom = GeometryConfig::from_toml_str(text).unwrap().build().unwrap();
    assert_eq!(geom.dimension(), 6);

    let mut parts: Vec<Particle> = (0..2000)
        .map(|i| Particle::new(Vec3::new(0.0, 0.0, 50.0), Vec3::unit_z(), 1e-9 * (i + 1) as f64))
        .collect();
    smear(&mut geom, &mut parts, &mut RandomGenerator::new(11)).unwrap();

    for p in &parts {
        assert!(p.ekin >= E_MIN && p.ekin <= E_MAX);
        assert!(p.position.x.abs() <= 2.0 + 1e-9 && p.position.y.abs() <= 2.0 + 1e-9);
        assert!(p.position.z >= 49.0 - 1e-9 && p.position.z <= 51.0 + 1e-9);
        assert!((p.direction.mag() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_bandwidth_stream_cycles() {
    let file = bandwidth_file(&[1.0, 2.0, 3.0]);
    let mut src = BandwidthSource::open(file.path()).unwrap();
    let read: Vec<f64> = (0..5).map(|_| src.next_value().unwrap()).collect();
    assert_eq!(read, vec![1.0, 2.0, 3.0, 1.0, 2.0]);

    let empty = bandwidth_file(&[]);
    let mut src = BandwidthSource::open(empty.path()).unwrap();
    assert!(matches!(src.next_value(), Err(SmearError::BandwidthRead { .. })));
}

#[test]
fn test_parallel_energies_in_range() {
    let file = bandwidth_file(&[0.5, 5.0, 50.0, 500.0]);
    let geom = Geometry::new(
        vec![Metric::with_scaling(Kernel::Energy, &[10.0]).unwrap()],
        1.0,
        Some(file.path()),
        None,
        None,
    )
    .unwrap();

    let mut parts = vec![Particle::new(Vec3::zero(), Vec3::unit_x(), 1.0); 10_000];
    let signal = smear_parallel(&geom, &mut parts, 512, 99).unwrap();
    assert_eq!(signal, 0);
    assert!(parts.iter().all(|p| p.ekin >= E_MIN && p.ekin <= E_MAX));
    // Huge kicks must have hit both clamps
    assert!(parts.iter().any(|p| p.ekin == E_MIN));
    assert!(parts.iter().any(|p| p.ekin == E_MAX));
}
