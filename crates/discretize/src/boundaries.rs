//! Bucket boundaries and value-to-bucket lookup.
//!
//! [`Boundaries`] holds the sorted thresholds that split the real line into
//! buckets. With thresholds `b0 < b1 < ... < b(k-1)` there are `k + 1`
//! buckets:
//!
//! ```text
//! bucket 0      bucket 1      ...   bucket k
//! (-inf, b0)    [b0, b1)            [b(k-1), +inf)
//! ```
//!
//! A value equal to a threshold belongs to the bucket *above* it.

use crate::error::{DiscretizeError, Result};

// ============================================================================
// Boundaries
// ============================================================================

/// Strictly increasing, finite bucket thresholds.
///
/// Immutable once built. An empty set of boundaries is valid and yields a
/// single bucket that every value falls into.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Boundaries {
    thresholds: Box<[f64]>,
}

impl Boundaries {
    /// Validate and wrap a list of thresholds.
    ///
    /// Fails if any threshold is not finite or the list is not strictly
    /// increasing.
    pub fn new(thresholds: Vec<f64>) -> Result<Self> {
        if let Some(pos) = thresholds.iter().position(|t| !t.is_finite()) {
            return Err(DiscretizeError::config(format!(
                "bin boundary {pos} is not finite: {}",
                thresholds[pos]
            )));
        }
        if let Some(pos) = thresholds.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DiscretizeError::config(format!(
                "bin boundaries must be strictly increasing, got {} followed by {}",
                thresholds[pos],
                thresholds[pos + 1]
            )));
        }
        Ok(Self {
            thresholds: thresholds.into_boxed_slice(),
        })
    }

    /// Build boundaries from sorted (non-decreasing) candidates, collapsing
    /// duplicates and dropping non-finite values.
    ///
    /// Used when boundaries are learned: repeated quantiles shrink the
    /// bucket count instead of failing.
    pub fn from_sorted_dedup(candidates: impl IntoIterator<Item = f64>) -> Self {
        let mut thresholds: Vec<f64> = Vec::new();
        for c in candidates.into_iter().filter(|c| c.is_finite()) {
            match thresholds.last() {
                Some(&last) if c <= last => {}
                _ => thresholds.push(c),
            }
        }
        Self {
            thresholds: thresholds.into_boxed_slice(),
        }
    }

    /// Threshold values.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.thresholds
    }

    /// Number of thresholds.
    #[inline]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Returns `true` if there are no thresholds (a single bucket).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Number of buckets these thresholds define.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.thresholds.len() + 1
    }

    /// Map a value to its bucket index.
    ///
    /// Binary search over the thresholds: the result is the number of
    /// thresholds `<= value`. NaN maps to the last bucket.
    #[inline]
    pub fn bucket(&self, value: f64) -> usize {
        if value.is_nan() {
            return self.thresholds.len();
        }
        self.thresholds.partition_point(|&t| t <= value)
    }

    /// Lower and upper edge of a bucket.
    ///
    /// The first bucket starts at `-inf` and the last ends at `+inf`.
    pub fn bucket_range(&self, bucket: usize) -> (f64, f64) {
        let lower = if bucket == 0 {
            f64::NEG_INFINITY
        } else {
            self.thresholds[bucket - 1]
        };
        let upper = self
            .thresholds
            .get(bucket)
            .copied()
            .unwrap_or(f64::INFINITY);
        (lower, upper)
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.thresholds.into_vec()
    }
}

impl TryFrom<Vec<f64>> for Boundaries {
    type Error = DiscretizeError;

    fn try_from(thresholds: Vec<f64>) -> Result<Self> {
        Self::new(thresholds)
    }
}

// ============================================================================
// Tests
// ============================================================================
