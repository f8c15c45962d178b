//! Discretizer configuration.
//!
//! [`DiscretizerConfig`] is both the construction input and the persisted
//! record of a layer. Use the builder:
//!
//! ```
//! use discretize::{DiscretizerConfig, OutputMode};
//!
//! // Fixed boundaries
//! let config = DiscretizerConfig::builder()
//!     .bin_boundaries(vec![0.0, 0.5, 1.0])
//!     .output_mode(OutputMode::OneHot)
//!     .build();
//!
//! // Learned boundaries
//! let config = DiscretizerConfig::builder()
//!     .num_bins(4)
//!     .epsilon(0.001)
//!     .build();
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::encode::{DType, OutputMode};
use crate::error::{DiscretizeError, Result};
use crate::summary::DEFAULT_EPSILON;

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

/// Configuration of a discretizer.
///
/// When built by a user, exactly one of `bin_boundaries` and `num_bins` must
/// be set. A record saved from an adapted layer carries both: the requested
/// `num_bins` and the learned boundaries.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug))]
pub struct DiscretizerConfig {
    /// Layer name (informational).
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fixed, strictly increasing bucket thresholds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_boundaries: Option<Vec<f64>>,

    /// Number of buckets to learn with adapt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_bins: Option<usize>,

    /// Accuracy of the quantile summary used by adapt (default: 0.01).
    /// Smaller values keep more summary points.
    #[builder(default = DEFAULT_EPSILON)]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Output encoding (default: `int`).
    #[builder(default)]
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Emit sparse output for the indicator and count encodings.
    #[builder(default)]
    #[serde(default)]
    pub sparse: bool,

    /// Output element type (default depends on `output_mode`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DType>,
}

impl DiscretizerConfig {
    /// Output dtype, falling back to the mode's default.
    pub fn resolved_dtype(&self) -> DType {
        self.dtype
            .unwrap_or_else(|| DType::default_for(self.output_mode))
    }

    /// Validate options shared by construction and restore.
    pub(crate) fn validate_options(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(DiscretizeError::config(format!(
                "epsilon must be in (0, 1], got {}",
                self.epsilon
            )));
        }
        if let Some(num_bins) = self.num_bins {
            if num_bins == 0 {
                return Err(DiscretizeError::config("num_bins must be >= 1, got 0"));
            }
        }
        if self.sparse && self.output_mode == OutputMode::Int {
            return Err(DiscretizeError::config(
                "sparse output cannot be used with output_mode \"int\"",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = DiscretizerConfig::builder().num_bins(4).build();
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.output_mode, OutputMode::Int);
        assert!(!config.sparse);
        assert_eq!(config.resolved_dtype(), DType::Int64);
        assert!(config.bin_boundaries.is_none());
    }

    #[test]
    fn resolved_dtype_follows_mode() {
        let config = DiscretizerConfig::builder()
            .num_bins(4)
            .output_mode(OutputMode::Count)
            .build();
        assert_eq!(config.resolved_dtype(), DType::Float32);

        let config = DiscretizerConfig::builder()
            .num_bins(4)
            .output_mode(OutputMode::Count)
            .dtype(DType::Int32)
            .build();
        assert_eq!(config.resolved_dtype(), DType::Int32);
    }

    #[test]
    fn validate_rejects_bad_epsilon() {
        for eps in [0.0, -0.1, 1.5, f64::NAN] {
            let config = DiscretizerConfig::builder().num_bins(4).epsilon(eps).build();
            assert!(config.validate_options().is_err(), "epsilon {eps}");
        }
    }

    #[test]
    fn validate_rejects_sparse_int() {
        let config = DiscretizerConfig::builder().num_bins(4).sparse(true).build();
        assert!(config.validate_options().unwrap_err().is_configuration());
    }

    #[test]
    fn json_shape() {
        let config = DiscretizerConfig::builder()
            .name("disc")
            .bin_boundaries(vec![0.0, 0.5])
            .output_mode(OutputMode::MultiHot)
            .build();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["name"], "disc");
        assert_eq!(json["output_mode"], "multi_hot");
        assert!(json.get("num_bins").is_none());

        let back: DiscretizerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn json_missing_optional_fields() {
        let back: DiscretizerConfig = serde_json::from_str(r#"{"num_bins": 3}"#).unwrap();
        assert_eq!(back.num_bins, Some(3));
        assert_eq!(back.epsilon, DEFAULT_EPSILON);
        assert_eq!(back.output_mode, OutputMode::Int);
    }
}
