//! Payload structures for the native storage format.
//!
//! These structs are designed for Postcard. Postcard is not self-describing,
//! so unlike [`DiscretizerConfig`] they never skip fields.

use serde::{Deserialize, Serialize};

use crate::config::DiscretizerConfig;
use crate::encode::{DType, OutputMode};

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add variants rather than modifying existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    V1(PayloadV1),
}

/// Version 1 payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadV1 {
    pub name: Option<String>,
    pub bin_boundaries: Option<Vec<f64>>,
    pub num_bins: Option<u64>,
    pub epsilon: f64,
    pub output_mode: OutputMode,
    pub sparse: bool,
    pub dtype: Option<DType>,
}

impl From<DiscretizerConfig> for PayloadV1 {
    fn from(config: DiscretizerConfig) -> Self {
        Self {
            name: config.name,
            bin_boundaries: config.bin_boundaries,
            num_bins: config.num_bins.map(|n| n as u64),
            epsilon: config.epsilon,
            output_mode: config.output_mode,
            sparse: config.sparse,
            dtype: config.dtype,
        }
    }
}

impl From<PayloadV1> for DiscretizerConfig {
    fn from(payload: PayloadV1) -> Self {
        Self {
            name: payload.name,
            bin_boundaries: payload.bin_boundaries,
            num_bins: payload.num_bins.map(|n| n as usize),
            epsilon: payload.epsilon,
            output_mode: payload.output_mode,
            sparse: payload.sparse,
            dtype: payload.dtype,
        }
    }
}
