//! # Geometry Module
//!
//! A geometry chains metrics into one smearing operation over the full
//! phase space of a particle.
//!
//! ## Perturbation
//!
//! ```text
//! global ──to_local──▶ metric[0] ──▶ metric[1] ──▶ … ──to_global──▶ global
//! ```
//!
//! Metrics run in order, so later metrics see the coordinates left by the
//! earlier ones. All of them share the current bandwidth, which is either
//! fixed or read per event from a bandwidth file.
//!
//! ## Copies
//!
//! A geometry is not safe to share between workers while its bandwidth
//! stream advances. [`Geometry::try_clone`] rebuilds an independent copy
//! with its own stream handle, positioned back at the first event.

mod bandwidth;
mod transform;

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::metric::Metric;
use crate::stochastic::Deviates;
use crate::types::{Particle, Vec3};

pub use bandwidth::BandwidthSource;
pub use transform::RigidTransform;

/// Ordered chain of metrics with placement and bandwidth
#[derive(Debug)]
pub struct Geometry {
    metrics: Vec<Metric>,
    bandwidth: f64,
    source: Option<BandwidthSource>,
    transform: RigidTransform,
}

impl Geometry {
    /// Create a geometry
    ///
    /// When `bandwidth_file` names a file, it is opened and the first
    /// bandwidth is read from it immediately, replacing `bandwidth`. An
    /// empty path counts as no file.
    pub fn new(
        metrics: Vec<Metric>,
        bandwidth: f64,
        bandwidth_file: Option<&Path>,
        translation: Option<Vec3>,
        rotation: Option<Vec3>,
    ) -> Result<Self> {
        let source = match bandwidth_file.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => Some(BandwidthSource::open(path)?),
            None => None,
        };
        let mut geom = Self {
            metrics,
            bandwidth,
            source,
            transform: RigidTransform::new(translation, rotation),
        };
        geom.advance()?;
        debug!(
            metrics = geom.metrics.len(),
            bandwidth = geom.bandwidth,
            streamed = geom.source.is_some(),
            "geometry created"
        );
        Ok(geom)
    }

    /// Geometry with a fixed bandwidth and no placement
    pub fn with_bandwidth(metrics: Vec<Metric>, bandwidth: f64) -> Self {
        Self {
            metrics,
            bandwidth,
            source: None,
            transform: RigidTransform::default(),
        }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Current bandwidth
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn bandwidth_file(&self) -> Option<&Path> {
        self.source.as_ref().map(|s| s.path())
    }

    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }

    /// Total number of phase-space coordinates the chain touches
    pub fn dimension(&self) -> usize {
        self.metrics.iter().map(|m| m.dimension()).sum()
    }

    /// Move to the next event's bandwidth
    ///
    /// Without a bandwidth file this is a no-op. Otherwise the next value
    /// is read, rewinding the file once if it is exhausted.
    pub fn advance(&mut self) -> Result<f64> {
        if let Some(source) = self.source.as_mut() {
            self.bandwidth = source.next_value()?;
        }
        Ok(self.bandwidth)
    }

    /// Position the bandwidth stream on event `index` and load its value
    pub fn seek_event(&mut self, index: u64) -> Result<f64> {
        if let Some(source) = self.source.as_mut() {
            source.seek_value(index)?;
            self.bandwidth = source.next_value()?;
        }
        Ok(self.bandwidth)
    }

    /// Smear `part` in place with the current bandwidth
    ///
    /// Returns the summed anomaly signal of the metrics (zero when none).
    pub fn perturb<D: Deviates + ?Sized>(&self, part: &mut Particle, rng: &mut D) -> usize {
        self.transform.to_local(part);
        let signal = self
            .metrics
            .iter()
            .map(|m| m.perturb(part, self.bandwidth, rng))
            .sum();
        self.transform.to_global(part);
        signal
    }

    /// Density correction of the whole chain at `part`
    pub fn jacobian(&self, part: &Particle) -> f64 {
        let mut local = *part;
        self.transform.to_local(&mut local);
        self.metrics
            .iter()
            .map(|m| m.jacobian(&local, self.bandwidth))
            .product()
    }

    /// Independent copy with its own bandwidth stream
    ///
    /// The stream is reopened from its file and primed with the first
    /// value, as for a freshly built geometry.
    pub fn try_clone(&self) -> Result<Self> {
        let source = match &self.source {
            Some(src) => Some(src.reopen()?),
            None => None,
        };
        let mut geom = Self {
            metrics: self.metrics.clone(),
            bandwidth: self.bandwidth,
            source,
            transform: self.transform,
        };
        geom.advance()?;
        Ok(geom)
    }
}
