//! Weighted quantile summary used to learn bucket boundaries.
//!
//! A [`QuantileSummary`] is a sorted list of `(value, weight)` pairs that
//! approximates the distribution of everything observed so far. Each batch is
//! summarized on its own, merged into the running summary, and the result is
//! compressed back to about `1 / epsilon` entries, so memory stays bounded no
//! matter how many batches are fed in.
//!
//! # Algorithm
//!
//! 1. **Summarize** a batch: sort it, then keep every `floor(n * epsilon)`-th value
//!    (at least every value), each carrying the number of values it stands for
//!    as its weight.
//! 2. **Merge** two summaries: concatenate, sort by value, compress.
//! 3. **Compress** to `epsilon`: evaluate the weighted empirical CDF at
//!    `epsilon, 2 * epsilon, ..., 1` by linear interpolation. The new values
//!    are the interpolated quantiles and the new weights the mass between
//!    consecutive quantiles.
//! 4. **Boundaries** for `k` buckets: compress to `1 / k` and drop the last
//!    entry (the maximum).

use crate::boundaries::Boundaries;

/// Default summary accuracy.
pub const DEFAULT_EPSILON: f64 = 0.01;

// =============================================================================
// QuantileSummary
// =============================================================================

/// Compressed weighted sample of observed values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuantileSummary {
    /// Sample values, sorted ascending.
    values: Vec<f64>,
    /// Weight carried by each value.
    weights: Vec<f64>,
}

impl QuantileSummary {
    /// An empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize one batch of values.
    ///
    /// Non-finite values are skipped; the caller is told how many through the
    /// second element of the returned tuple.
    pub fn summarize(values: impl IntoIterator<Item = f64>, epsilon: f64) -> (Self, usize) {
        let mut skipped = 0usize;
        let mut sorted: Vec<f64> = values
            .into_iter()
            .filter(|v| {
                let keep = v.is_finite();
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        if n == 0 {
            return (Self::new(), skipped);
        }

        // Every kept value stands for exactly `stride` input values.
        let increment = (n as f64 / (1.0 / epsilon)) as usize;
        let stride = increment.max(1);

        let values: Vec<f64> = sorted.into_iter().skip(increment).step_by(stride).collect();
        let weights = vec![stride as f64; values.len()];
        (Self { values, weights }, skipped)
    }

    /// Merge `other` into this summary and compress to `epsilon`.
    pub fn merge(&self, other: &Self, epsilon: f64) -> Self {
        let mut pairs: Vec<(f64, f64)> = other
            .values
            .iter()
            .copied()
            .zip(other.weights.iter().copied())
            .chain(self.values.iter().copied().zip(self.weights.iter().copied()))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (values, weights) = pairs.into_iter().unzip();
        Self { values, weights }.compress(epsilon)
    }

    /// Compress to roughly `1 / epsilon` entries.
    ///
    /// Summaries already smaller than that are returned unchanged.
    pub fn compress(&self, epsilon: f64) -> Self {
        if (self.len() as f64) * epsilon < 1.0 {
            return self.clone();
        }

        let mut cum_weights = Vec::with_capacity(self.len());
        let mut acc = 0.0;
        for &w in &self.weights {
            acc += w;
            cum_weights.push(acc);
        }
        let total = acc;
        let cum_percents: Vec<f64> = cum_weights.iter().map(|c| c / total).collect();

        // Guard against `1 / epsilon` landing a hair above an integer.
        let n_slots = ((1.0 / epsilon) - 1e-9).ceil().max(1.0) as usize;
        let mut values = Vec::with_capacity(n_slots);
        let mut weights = Vec::with_capacity(n_slots);
        let mut prev = 0.0;
        for i in 0..n_slots {
            let percent = epsilon + i as f64 * epsilon;
            values.push(interp(percent, &cum_percents, &self.values));
            let cum = interp(percent, &cum_percents, &cum_weights);
            weights.push(cum - prev);
            prev = cum;
        }

        Self { values, weights }
    }

    /// Bucket boundaries for `num_bins` equal-frequency buckets.
    ///
    /// Repeated quantiles collapse, so the result may hold fewer than
    /// `num_bins - 1` thresholds. An empty summary yields no thresholds.
    pub fn bin_boundaries(&self, num_bins: usize) -> Boundaries {
        let compressed = self.compress(1.0 / num_bins as f64);
        let n = compressed.values.len().saturating_sub(1);
        Boundaries::from_sorted_dedup(compressed.values.into_iter().take(n))
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all weights (approximate number of values observed).
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Piecewise-linear interpolation of `fp` over `xp` at `x`.
///
/// `xp` must be non-decreasing. Values outside the range clamp to the first
/// or last `fp`.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let last = xp.len() - 1;
    if x >= xp[last] {
        return fp[last];
    }
    if x < xp[0] {
        return fp[0];
    }
    // xp[j] <= x < xp[j + 1]
    let j = xp.partition_point(|&p| p <= x) - 1;
    let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
    fp[j] + slope * (x - xp[j])
}

// =============================================================================
// Tests
// =============================================================================
