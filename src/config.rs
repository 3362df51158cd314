//! # Configuration
//!
//! Serializable description of a geometry, as written in TOML:
//!
//! ```toml
//! bandwidth = 1.0
//! bandwidth_file = "bw.dat"     # optional, overrides `bandwidth`
//! translation = [0.0, 0.0, 10.0]
//! rotation = [0.0, 0.0, 1.5708]
//!
//! [[metrics]]
//! kind = "lethargy"
//! scaling = [0.1]
//!
//! [[metrics]]
//! kind = "volume"
//! scaling = [1.0, 1.0, 0.5]
//! params = [-5.0, 5.0, -5.0, 5.0, 0.0, 100.0]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmearError};
use crate::geometry::Geometry;
use crate::metric::{Kernel, KernelKind, Metric};
use crate::types::Vec3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub kind: KernelKind,
    /// Per-coordinate kick scaling; zeros when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

impl MetricConfig {
    pub fn build(&self) -> Result<Metric> {
        let kernel = Kernel::from_params(self.kind, &self.params)?;
        let dimension = self
            .scaling
            .as_ref()
            .map_or(kernel.default_dimension(), |s| s.len());
        Metric::new(dimension, self.scaling.as_deref(), kernel)
    }
}

impl From<&Metric> for MetricConfig {
    fn from(metric: &Metric) -> Self {
        Self {
            kind: metric.kernel().kind(),
            scaling: Some(metric.scaling().iter().map(|&s| f64::from(s)).collect()),
            params: metric.kernel().params(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "GeometryConfig::default_bandwidth")]
    pub bandwidth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f64; 3]>,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

impl GeometryConfig {
    fn default_bandwidth() -> f64 {
        1.0
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| SmearError::Config(err.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| SmearError::Config(err.to_string()))
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SmearError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Build the geometry, opening the bandwidth file if one is named
    pub fn build(&self) -> Result<Geometry> {
        let metrics = self
            .metrics
            .iter()
            .map(MetricConfig::build)
            .collect::<Result<Vec<_>>>()?;
        Geometry::new(
            metrics,
            self.bandwidth,
            self.bandwidth_file.as_deref(),
            self.translation.map(Vec3::from_array),
            self.rotation.map(Vec3::from_array),
        )
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            bandwidth: Self::default_bandwidth(),
            bandwidth_file: None,
            translation: None,
            rotation: None,
            metrics: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
bandwidth = 0.5
translation = [0.0, 0.0, 10.0]

[[metrics]]
kind = "lethargy"
scaling = [0.1]

[[metrics]]
kind = "surface-xy"
scaling = [1.0, 2.0]
params = [-5.0, 5.0, -3.0, 3.0]

[[metrics]]
kind = "guide"
scaling = [1.0, 1.0, 2.0, 2.0]
params = [6.0, 20.0, 1000.0, 0.0]

[[metrics]]
kind = "isotropic"
"#;

    #[test]
    fn test_parse_and_build() {
        let cfg = GeometryConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.metrics.len(), 4);
        assert_eq!(cfg.metrics[1].kind, KernelKind::SurfaceXY);

        let geom = cfg.build().unwrap();
        assert_eq!(geom.bandwidth(), 0.5);
        assert_eq!(geom.metrics()[3].scaling(), &[0.0f32]);
        assert_eq!(geom.transform().translation, Some(Vec3::new(0.0, 0.0, 10.0)));
        assert!(geom.transform().rotation.is_none());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let cfg = GeometryConfig::from_toml_str(SAMPLE).unwrap();
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(GeometryConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_metric_config_from_metric() {
        let cfg = GeometryConfig::from_toml_str(SAMPLE).unwrap();
        let geom = cfg.build().unwrap();
        let back: Vec<MetricConfig> = geom.metrics().iter().map(MetricConfig::from).collect();
        assert_eq!(back[1], cfg.metrics[1]);
        assert_eq!(back[1].build().unwrap(), geom.metrics()[1]);
    }

    #[test]
    fn test_bad_params_rejected() {
        let text = r#"
[[metrics]]
kind = "volume"
params = [0.0, 1.0]
"#;
        let cfg = GeometryConfig::from_toml_str(text).unwrap();
        assert!(matches!(cfg.build(), Err(SmearError::InvalidMetric(_))));
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let text = "[[metrics]]\nkind = \"spherical\"\n";
        assert!(matches!(GeometryConfig::from_toml_str(text), Err(SmearError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeometryConfig::load(dir.path().join("geom.toml")).unwrap_err();
        assert!(matches!(err, SmearError::ConfigIo { .. }));
    }

    #[test]
    fn test_load_with_bandwidth_file() {
        let dir = tempfile::tempdir().unwrap();
        let bw_path = dir.path().join("bw.dat");
        let mut bw = fs::File::create(&bw_path).unwrap();
        bw.write_all(&0.25f32.to_ne_bytes()).unwrap();
        drop(bw);

        let cfg = GeometryConfig {
            metrics: vec![MetricConfig {
                kind: KernelKind::Energy,
                scaling: Some(vec![1.0]),
                params: Vec::new(),
            }],
            bandwidth_file: Some(bw_path),
            ..Default::default()
        };
        let cfg_path = dir.path().join("geom.toml");
        fs::write(&cfg_path, cfg.to_toml_string().unwrap()).unwrap();

        let geom = GeometryConfig::load(&cfg_path).unwrap().build().unwrap();
        assert_eq!(geom.bandwidth(), 0.25);
    }
}
