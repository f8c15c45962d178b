//! Output encodings for bucket indices.
//!
//! After every value has been mapped to a bucket, [`OutputMode`] decides how
//! the indices are returned:
//!
//! | Mode        | Output shape                                   | Values          |
//! |-------------|------------------------------------------------|-----------------|
//! | `Int`       | input shape                                    | bucket index    |
//! | `OneHot`    | input shape + `[depth]` (trailing 1 replaced)  | 0 / 1           |
//! | `MultiHot`  | input shape with last axis replaced by `depth` | 0 / 1           |
//! | `Count`     | input shape with last axis replaced by `depth` | occurrences     |
//!
//! `depth` is the number of buckets. `OneHot` is a `MultiHot` over a
//! trailing axis of size one, so every input element becomes one row.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{DiscretizeError, Result};
use crate::tensor::SparseTensor;

// =============================================================================
// OutputMode
// =============================================================================

/// How bucket indices are encoded in the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Bucket indices, same shape as the input.
    #[default]
    Int,
    /// One indicator vector per input element.
    OneHot,
    /// Presence of each bucket across the last axis.
    MultiHot,
    /// Occurrences of each bucket across the last axis.
    Count,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Int => "int",
            OutputMode::OneHot => "one_hot",
            OutputMode::MultiHot => "multi_hot",
            OutputMode::Count => "count",
        }
    }

    /// Shape of the encoded output for an input of `input_shape`.
    pub fn output_shape(self, input_shape: &[usize], depth: usize) -> Vec<usize> {
        match self {
            OutputMode::Int => input_shape.to_vec(),
            OutputMode::OneHot => {
                let mut shape = input_shape.to_vec();
                if shape.last() == Some(&1) {
                    shape.pop();
                }
                shape.push(depth);
                shape
            }
            OutputMode::MultiHot | OutputMode::Count => {
                let mut shape = input_shape.to_vec();
                shape.pop();
                shape.push(depth);
                shape
            }
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = DiscretizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(OutputMode::Int),
            "one_hot" => Ok(OutputMode::OneHot),
            "multi_hot" => Ok(OutputMode::MultiHot),
            "count" => Ok(OutputMode::Count),
            other => Err(DiscretizeError::config(format!(
                "invalid output_mode {other:?}, expected one of \"int\", \"one_hot\", \"multi_hot\", \"count\""
            ))),
        }
    }
}

// =============================================================================
// DType
// =============================================================================

/// Element type of the encoded output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    /// Default output type for a mode: `int64` for indices, `float32` for
    /// the indicator and count encodings.
    pub fn default_for(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Int => DType::Int64,
            _ => DType::Float32,
        }
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        matches!(self, DType::Int32 | DType::Int64)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = DiscretizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int32" => Ok(DType::Int32),
            "int64" => Ok(DType::Int64),
            "float32" => Ok(DType::Float32),
            "float64" => Ok(DType::Float64),
            other => Err(DiscretizeError::config(format!("unsupported dtype {other:?}"))),
        }
    }
}

// =============================================================================
// Dense encoding
// =============================================================================

/// Encode dense bucket indices.
pub(crate) fn encode_dense(
    buckets: ArrayD<usize>,
    mode: OutputMode,
    depth: usize,
) -> Result<ArrayD<i64>> {
    if mode == OutputMode::Int {
        return Ok(buckets.mapv(|b| b as i64));
    }

    let in_shape = buckets.shape().to_vec();
    let out_shape = match in_shape.len() {
        0 => vec![depth],
        _ => mode.output_shape(&in_shape, depth),
    };

    // Width of the axis being collapsed.
    let lane = match mode {
        OutputMode::OneHot => 1,
        _ => in_shape.last().copied().unwrap_or(1),
    };
    let n_rows = out_shape[..out_shape.len() - 1].iter().product::<usize>();

    let mut out = vec![0i64; n_rows * depth];
    // Logical order iteration keeps rows contiguous for any memory layout.
    let flat: Vec<usize> = buckets.iter().copied().collect();
    if lane > 0 {
        for (row, chunk) in flat.chunks(lane).enumerate() {
            let dst = &mut out[row * depth..(row + 1) * depth];
            for &b in chunk {
                match mode {
                    OutputMode::Count => dst[b] += 1,
                    _ => dst[b] = 1,
                }
            }
        }
    }

    ArrayD::from_shape_vec(IxDyn(&out_shape), out)
        .map_err(|e| DiscretizeError::shape(format!("cannot build output of shape {out_shape:?}: {e}")))
}

// =============================================================================
// Sparse encoding
// =============================================================================

/// Encode sparse bucket indices, keeping only stored entries.
///
/// Implicit entries are not bucketed and contribute nothing to the
/// indicator or count encodings.
pub(crate) fn encode_sparse(
    buckets: &SparseTensor<usize>,
    mode: OutputMode,
    depth: usize,
) -> SparseTensor<i64> {
    if mode == OutputMode::Int {
        return buckets.map_values(|&b| b as i64);
    }

    let in_shape = buckets.shape();
    let out_shape = match in_shape.len() {
        0 => vec![depth],
        _ => mode.output_shape(in_shape, depth),
    };
    // Number of leading input axes that survive into the output coordinate.
    let keep = out_shape.len() - 1;

    let mut entries: BTreeMap<Vec<usize>, i64> = BTreeMap::new();
    for (coord, &b) in buckets.iter() {
        let mut key = coord[..keep.min(coord.len())].to_vec();
        key.push(b);
        let slot = entries.entry(key).or_insert(0);
        match mode {
            OutputMode::Count => *slot += 1,
            _ => *slot = 1,
        }
    }

    SparseTensor::from_sorted_map(entries, out_shape)
}

// =============================================================================
// Tests
// =============================================================================
