//! Per-event bandwidth stream.
//!
//! The stream is a raw file of native-endian `f32` values, one per event.
//! A stream shorter than the particle list is cycled: a failed read rewinds
//! to the start and reads once more before giving up.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SmearError};

const VALUE_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// Open sequential reader over a bandwidth file
#[derive(Debug)]
pub struct BandwidthSource {
    path: PathBuf,
    reader: BufReader<File>,
}

impl BandwidthSource {
    /// Open `path` positioned at its first value
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| SmearError::BandwidthOpen {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
        })
    }

    /// Fresh handle on the same file, positioned at its first value
    pub fn reopen(&self) -> Result<Self> {
        Self::open(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_value(&mut self) -> io::Result<f32> {
        let mut buf = [0u8; VALUE_SIZE as usize];
        self.reader.read_exact(&mut buf)?;
        Ok(f32::from_ne_bytes(buf))
    }

    fn read_error(&self) -> SmearError {
        SmearError::BandwidthRead {
            path: self.path.clone(),
        }
    }

    /// Read the next bandwidth, rewinding once if the stream is exhausted
    pub fn next_value(&mut self) -> Result<f64> {
        match self.read_value() {
            Ok(v) => Ok(f64::from(v)),
            Err(err) => {
                debug!(path = %self.path.display(), %err, "rewinding bandwidth stream");
                self.reader.rewind().map_err(|_| self.read_error())?;
                self.read_value().map(f64::from).map_err(|_| self.read_error())
            }
        }
    }

    /// Position the stream so the next read returns value `index`
    ///
    /// The index wraps around the number of complete values in the file.
    pub fn seek_value(&mut self, index: u64) -> Result<()> {
        let len = self
            .reader
            .get_ref()
            .metadata()
            .map_err(|_| self.read_error())?
            .len();
        let count = len / VALUE_SIZE;
        if count == 0 {
            return Err(self.read_error());
        }
        self.reader
            .seek(SeekFrom::Start((index % count) * VALUE_SIZE))
            .map_err(|_| self.read_error())?;
        Ok(())
    }
}
