//! Saving and restoring discretizers.
//!
//! Two formats carry the same [`DiscretizerConfig`] record:
//!
//! - **JSON**: human-readable, produced by `serde_json`.
//! - **Native**: a compact checksummed binary envelope (see [`native`]).
//!
//! A restored layer produces bit-identical output to the saved one.
//!
//! ```
//! use discretize::{Discretizer, OutputMode, Tensor};
//! use ndarray::array;
//!
//! let layer = Discretizer::with_boundaries(vec![0.0, 1.0], OutputMode::OneHot).unwrap();
//! let bytes = layer.to_bytes().unwrap();
//! let restored = Discretizer::from_bytes(&bytes).unwrap();
//!
//! let x = Tensor::from(array![-0.5, 0.5, 1.5]);
//! assert_eq!(layer.apply(&x).unwrap(), restored.apply(&x).unwrap());
//! ```

pub mod native;
pub mod payload;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::config::DiscretizerConfig;
use crate::discretizer::Discretizer;
use crate::error::Result;

use native::{read_payload, write_payload, FormatFlags};
use payload::{Payload, PayloadV1};

// ============================================================================
// Errors
// ============================================================================

/// Error writing a persisted discretizer.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("payload of {0} bytes exceeds the format limit")]
    TooLarge(usize),
}

/// Error reading a persisted discretizer.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("not a discretizer file (bad magic bytes)")]
    NotADiscretizer,

    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("input truncated: expected at least {expected} bytes")]
    Truncated { expected: usize },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload decoding error: {0}")]
    Decoding(#[from] postcard::Error),
}

// ============================================================================
// Discretizer persistence
// ============================================================================

impl Discretizer {
    /// Pretty-printed JSON record of this layer.
    pub fn to_json_string(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.config()).map_err(SaveError::from)?;
        Ok(json)
    }

    /// Restore a layer from a JSON record.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DiscretizerConfig = serde_json::from_str(json).map_err(LoadError::from)?;
        Self::from_config(config)
    }

    /// Write the JSON record to `writer`.
    pub fn save_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.config()).map_err(SaveError::from)?;
        Ok(())
    }

    /// Read a JSON record from `reader`.
    pub fn load_json<R: Read>(reader: R) -> Result<Self> {
        let config: DiscretizerConfig = serde_json::from_reader(reader).map_err(LoadError::from)?;
        Self::from_config(config)
    }

    /// Write the JSON record to a file.
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path).map_err(SaveError::from)?;
        let mut writer = BufWriter::new(file);
        self.save_json(&mut writer)?;
        writer.flush().map_err(SaveError::from)?;
        Ok(())
    }

    /// Read a JSON record from a file.
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path).map_err(LoadError::from)?;
        Self::load_json(BufReader::new(file))
    }

    /// Write the native binary record to `writer`.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut flags = FormatFlags::empty();
        if self.is_adapted() {
            flags.set(FormatFlags::ADAPTED);
        }
        if self.is_sparse_output() {
            flags.set(FormatFlags::SPARSE_OUTPUT);
        }
        let payload = Payload::V1(PayloadV1::from(self.config()));
        write_payload(&mut writer, flags, &payload)?;
        Ok(())
    }

    /// Read a native binary record from `reader`.
    pub fn load<R: Read>(mut reader: R) -> Result<Self> {
        let (header, payload) = read_payload(&mut reader)?;
        let Payload::V1(v1) = payload;
        let layer = Self::from_config(DiscretizerConfig::from(v1))?;
        if header.flags.contains(FormatFlags::ADAPTED) != layer.is_adapted() {
            log::warn!("native header flags disagree with the stored record; trusting the record");
        }
        Ok(layer)
    }

    /// Native binary record as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.save(&mut buf)?;
        Ok(buf)
    }

    /// Restore a layer from native binary bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(bytes)
    }

    /// Write the native binary record to a file.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path).map_err(SaveError::from)?;
        let mut writer = BufWriter::new(file);
        self.save(&mut writer)?;
        writer.flush().map_err(SaveError::from)?;
        Ok(())
    }

    /// Read a native binary record from a file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path).map_err(LoadError::from)?;
        Self::load(BufReader::new(file))
    }
}
