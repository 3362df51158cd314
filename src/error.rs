//! # Errors
//!
//! Fatal conditions raised while building or sequencing a geometry.
//! Non-fatal conditions (an exhausted rejection budget) are logged instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmearError {
    /// The bandwidth stream could not be opened
    #[error("cannot open bandwidth file {path}: {source}")]
    BandwidthOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The bandwidth stream could not be read, even after rewinding it
    #[error("cannot read bandwidth from {path}: stream exhausted or unreadable")]
    BandwidthRead { path: PathBuf },
    #[error("invalid metric: {0}")]
    InvalidMetric(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("cannot read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SmearError>;
