//! The discretization layer.
//!
//! A [`Discretizer`] maps every scalar of its input to a bucket index and
//! encodes the indices according to its [`OutputMode`].
//!
//! # Lifecycle
//!
//! ```text
//!  new(num_bins)  ──► Unconfigured ──adapt()──► Configured ──apply()──► output
//!  new(bin_boundaries) ─────────────────────────► Configured
//! ```
//!
//! A layer built from fixed boundaries can never be adapted. A layer built
//! from `num_bins` can be adapted again; each call starts from an empty
//! summary.
//!
//! # Example
//!
//! ```
//! use discretize::{Discretizer, OutputMode, Tensor};
//! use ndarray::array;
//!
//! let layer = Discretizer::with_boundaries(vec![0.0, 0.5, 1.0], OutputMode::Int).unwrap();
//! let out = layer.apply(&Tensor::from(array![-1.0, 0.0, 0.1, 0.8, 1.2])).unwrap();
//! let buckets: Vec<f64> = out.to_dense_f64().iter().copied().collect();
//! assert_eq!(buckets, vec![0.0, 1.0, 1.0, 2.0, 3.0]);
//! ```

use ndarray::ArrayD;

use crate::boundaries::Boundaries;
use crate::config::DiscretizerConfig;
use crate::encode::{encode_dense, encode_sparse, DType, OutputMode};
use crate::error::{DiscretizeError, Result};
use crate::parallel::{Parallelism, PARALLEL_MIN_ELEMENTS};
use crate::summary::QuantileSummary;
use crate::tensor::{Encoded, SparseTensor, Tensor};

// =============================================================================
// State
// =============================================================================

/// Where the boundaries of a layer come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinSource {
    /// Supplied at construction; adapt is not allowed.
    Fixed,
    /// Learned by adapt into (at most) `num_bins` buckets.
    Learned { num_bins: usize },
}

/// Whether boundaries are available.
#[derive(Clone, Debug, PartialEq)]
pub enum BinState {
    /// Waiting for adapt.
    Unconfigured,
    /// Boundaries are fixed; apply is allowed.
    Configured(Boundaries),
}

// =============================================================================
// Discretizer
// =============================================================================

/// Buckets continuous values by sorted thresholds.
#[derive(Clone, Debug)]
pub struct Discretizer {
    name: Option<String>,
    source: BinSource,
    state: BinState,
    /// Adapt accumulator. Only used by learned layers.
    summary: QuantileSummary,
    epsilon: f64,
    output_mode: OutputMode,
    sparse: bool,
    dtype: DType,
}

impl Discretizer {
    /// Build a layer from a user configuration.
    ///
    /// Exactly one of `bin_boundaries` and `num_bins` must be set.
    pub fn new(config: DiscretizerConfig) -> Result<Self> {
        match (&config.bin_boundaries, config.num_bins) {
            (Some(_), Some(_)) => {
                return Err(DiscretizeError::config(
                    "both bin_boundaries and num_bins are set; provide exactly one",
                ))
            }
            (None, None) => {
                return Err(DiscretizeError::config(
                    "one of bin_boundaries or num_bins must be set",
                ))
            }
            _ => {}
        }
        Self::from_config(config)
    }

    /// Fixed-boundary layer.
    pub fn with_boundaries(bin_boundaries: Vec<f64>, output_mode: OutputMode) -> Result<Self> {
        Self::new(
            DiscretizerConfig::builder()
                .bin_boundaries(bin_boundaries)
                .output_mode(output_mode)
                .build(),
        )
    }

    /// Layer that learns `num_bins` buckets through [`adapt`](Self::adapt).
    pub fn with_num_bins(num_bins: usize, output_mode: OutputMode) -> Result<Self> {
        Self::new(
            DiscretizerConfig::builder()
                .num_bins(num_bins)
                .output_mode(output_mode)
                .build(),
        )
    }

    /// Rebuild a layer from a persisted record.
    ///
    /// Unlike [`new`](Self::new), a record may carry both `num_bins` and
    /// `bin_boundaries`: that is an adapted layer, restored in the
    /// configured state and still adaptable.
    pub fn from_config(config: DiscretizerConfig) -> Result<Self> {
        config.validate_options()?;
        let dtype = config.resolved_dtype();

        let (source, state) = match (config.bin_boundaries, config.num_bins) {
            (Some(bounds), None) => (BinSource::Fixed, BinState::Configured(Boundaries::new(bounds)?)),
            (None, Some(num_bins)) => (BinSource::Learned { num_bins }, BinState::Unconfigured),
            (Some(bounds), Some(num_bins)) => {
                if bounds.len() >= num_bins {
                    return Err(DiscretizeError::config(format!(
                        "adapted layer has {} boundaries, more than num_bins - 1 = {}",
                        bounds.len(),
                        num_bins - 1
                    )));
                }
                (
                    BinSource::Learned { num_bins },
                    BinState::Configured(Boundaries::new(bounds)?),
                )
            }
            (None, None) => {
                return Err(DiscretizeError::config(
                    "one of bin_boundaries or num_bins must be set",
                ))
            }
        };

        Ok(Self {
            name: config.name,
            source,
            state,
            summary: QuantileSummary::new(),
            epsilon: config.epsilon,
            output_mode: config.output_mode,
            sparse: config.sparse,
            dtype,
        })
    }

    /// The persisted record of this layer.
    ///
    /// Applying [`from_config`](Self::from_config) to the result gives a
    /// layer with identical apply output.
    pub fn config(&self) -> DiscretizerConfig {
        let (bin_boundaries, num_bins) = match (&self.source, &self.state) {
            (BinSource::Fixed, BinState::Configured(b)) => (Some(b.as_slice().to_vec()), None),
            (BinSource::Learned { num_bins }, BinState::Configured(b)) => {
                (Some(b.as_slice().to_vec()), Some(*num_bins))
            }
            (BinSource::Learned { num_bins }, BinState::Unconfigured) => (None, Some(*num_bins)),
            (BinSource::Fixed, BinState::Unconfigured) => (None, None),
        };
        DiscretizerConfig {
            name: self.name.clone(),
            bin_boundaries,
            num_bins,
            epsilon: self.epsilon,
            output_mode: self.output_mode,
            sparse: self.sparse,
            dtype: Some(self.dtype),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> BinSource {
        self.source
    }

    pub fn state(&self) -> &BinState {
        &self.state
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn is_sparse_output(&self) -> bool {
        self.sparse
    }

    /// Boundaries, once configured.
    pub fn boundaries(&self) -> Option<&Boundaries> {
        match &self.state {
            BinState::Configured(b) => Some(b),
            BinState::Unconfigured => None,
        }
    }

    /// Boundary values, once configured.
    pub fn bin_boundaries(&self) -> Option<&[f64]> {
        self.boundaries().map(Boundaries::as_slice)
    }

    /// Effective number of buckets, once configured.
    ///
    /// For learned layers this can be below the requested `num_bins` when the
    /// sample had repeated quantiles.
    pub fn num_bins(&self) -> Option<usize> {
        self.boundaries().map(Boundaries::n_buckets)
    }

    #[inline]
    pub fn is_configured(&self) -> bool {
        matches!(self.state, BinState::Configured(_))
    }

    /// `true` for learned layers whose boundaries are available.
    pub fn is_adapted(&self) -> bool {
        matches!(self.source, BinSource::Learned { .. }) && self.is_configured()
    }

    /// `true` for layers built from `num_bins`, adapted or not.
    pub fn is_learned(&self) -> bool {
        matches!(self.source, BinSource::Learned { .. })
    }

    /// Accumulated adapt summary (empty outside of an adapt pass).
    pub fn summary(&self) -> &QuantileSummary {
        &self.summary
    }

    fn configured(&self) -> Result<&Boundaries> {
        self.boundaries().ok_or_else(|| {
            DiscretizeError::config(
                "discretizer has no bin boundaries yet; call adapt() before applying it",
            )
        })
    }

    fn learned_num_bins(&self) -> Result<usize> {
        match self.source {
            BinSource::Learned { num_bins } => Ok(num_bins),
            BinSource::Fixed => Err(DiscretizeError::config(
                "cannot adapt a discretizer that was built with bin_boundaries; use num_bins instead",
            )),
        }
    }

    // =========================================================================
    // Adapt
    // =========================================================================

    /// Learn boundaries from one sample.
    pub fn adapt(&mut self, data: &Tensor) -> Result<()> {
        self.adapt_batches(std::iter::once(data))
    }

    /// Learn boundaries from a stream of batches.
    ///
    /// The summary is reset first, so earlier adapt calls have no effect on
    /// the result. The new boundaries replace the old ones only after every
    /// batch has been consumed; on error the layer keeps its previous state.
    pub fn adapt_batches<'a, I>(&mut self, batches: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Tensor>,
    {
        self.learned_num_bins()?;
        self.reset_state();
        for batch in batches {
            self.update_state(batch)?;
        }
        self.finalize_state()
    }

    /// Clear the adapt summary. Boundaries are left untouched.
    pub fn reset_state(&mut self) {
        self.summary = QuantileSummary::new();
    }

    /// Fold one batch into the adapt summary.
    pub fn update_state(&mut self, batch: &Tensor) -> Result<()> {
        self.learned_num_bins()?;
        let (batch_summary, skipped) = QuantileSummary::summarize(batch.stored_values(), self.epsilon);
        if skipped > 0 {
            log::warn!("adapt skipped {skipped} non-finite values");
        }
        log::debug!(
            "adapt batch of shape {:?}: {} summary points",
            batch.shape(),
            batch_summary.len()
        );
        self.summary = batch_summary.merge(&self.summary, self.epsilon);
        Ok(())
    }

    /// Turn the adapt summary into boundaries and move to the configured
    /// state.
    pub fn finalize_state(&mut self) -> Result<()> {
        let num_bins = self.learned_num_bins()?;
        let boundaries = self.summary.bin_boundaries(num_bins);
        if boundaries.n_buckets() < num_bins {
            log::warn!(
                "adapt found {} distinct boundaries for {num_bins} bins; using {} buckets",
                boundaries.len(),
                boundaries.n_buckets()
            );
        }
        log::debug!("adapt finished with boundaries {:?}", boundaries.as_slice());
        self.state = BinState::Configured(boundaries);
        Ok(())
    }

    // =========================================================================
    // Apply
    // =========================================================================

    /// Bucket and encode `input` sequentially.
    pub fn apply(&self, input: &Tensor) -> Result<Encoded> {
        self.apply_with(input, Parallelism::Sequential)
    }

    /// Bucket and encode `input`, splitting large dense inputs across the
    /// rayon pool when `parallelism` allows.
    pub fn apply_with(&self, input: &Tensor, parallelism: Parallelism) -> Result<Encoded> {
        let boundaries = self.configured()?;
        let depth = boundaries.n_buckets();

        let encoded: Tensor<i64> = match input {
            Tensor::Dense(array) => {
                let buckets = bucketize_dense(boundaries, array, parallelism)?;
                let dense = encode_dense(buckets, self.output_mode, depth)?;
                if self.sparse {
                    Tensor::Sparse(SparseTensor::from_dense(&dense))
                } else {
                    Tensor::Dense(dense)
                }
            }
            Tensor::Sparse(sparse) => {
                let buckets = sparse.map_values(|&v| boundaries.bucket(v));
                Tensor::Sparse(encode_sparse(&buckets, self.output_mode, depth))
            }
        };

        Ok(if self.dtype.is_integer() {
            Encoded::Int(encoded)
        } else {
            Encoded::Float(to_float(encoded))
        })
    }

    /// Bucket index of a single value.
    pub fn bucket(&self, value: f64) -> Result<usize> {
        Ok(self.configured()?.bucket(value))
    }

    /// Output shape for an input of `input_shape`.
    pub fn compute_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if self.output_mode == OutputMode::Int {
            return Ok(input_shape.to_vec());
        }
        let depth = self.configured()?.n_buckets();
        Ok(match input_shape.len() {
            0 => vec![depth],
            _ => self.output_mode.output_shape(input_shape, depth),
        })
    }
}

fn bucketize_dense(
    boundaries: &Boundaries,
    array: &ArrayD<f64>,
    parallelism: Parallelism,
) -> Result<ArrayD<usize>> {
    if !parallelism.is_parallel() || array.len() < PARALLEL_MIN_ELEMENTS {
        return Ok(array.mapv(|v| boundaries.bucket(v)));
    }
    let contiguous = array.as_standard_layout();
    let values = contiguous
        .as_slice()
        .ok_or_else(|| DiscretizeError::shape("input is not contiguous"))?;
    let buckets = parallelism.maybe_par_map(values, |&v| boundaries.bucket(v));
    ArrayD::from_shape_vec(array.raw_dim(), buckets)
        .map_err(|e| DiscretizeError::shape(format!("cannot reshape buckets: {e}")))
}

fn to_float(t: Tensor<i64>) -> Tensor<f64> {
    match t {
        Tensor::Dense(a) => Tensor::Dense(a.mapv(|v| v as f64)),
        Tensor::Sparse(s) => Tensor::Sparse(s.map_values(|&v| v as f64)),
    }
}

// =============================================================================
// Tests
// =============================================================================
