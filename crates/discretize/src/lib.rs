//! discretize: bucketing of continuous values for preprocessing pipelines.
//!
//! A [`Discretizer`] maps each scalar of an input tensor to the index of the
//! bucket it falls into, then encodes the indices as integers or as one-hot,
//! multi-hot or count vectors. Boundaries are either supplied up front or
//! learned from data with [`Discretizer::adapt`].
//!
//! # Key Types
//!
//! - [`Discretizer`] - The layer: construct, adapt, apply, save
//! - [`DiscretizerConfig`] - Configuration builder and persisted record
//! - [`Tensor`] / [`SparseTensor`] - Dense (`ndarray`) or sparse inputs
//! - [`Encoded`] - Integer or float output
//! - [`QuantileSummary`] - Streaming accumulator behind adapt
//!
//! # Example
//!
//! ```
//! use discretize::{Discretizer, OutputMode, Tensor};
//! use ndarray::array;
//!
//! let mut layer = Discretizer::with_num_bins(4, OutputMode::OneHot).unwrap();
//! layer.adapt(&Tensor::from(array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])).unwrap();
//! assert_eq!(layer.bin_boundaries(), Some(&[2.0, 4.0, 6.0][..]));
//!
//! let out = layer.apply(&Tensor::from(array![0.0, 5.0])).unwrap();
//! assert_eq!(out.shape(), &[2, 4]);
//! ```
//!
//! # Streaming
//!
//! The layer implements [`pipeline::Transform`], so it can be mapped over a
//! stream of batches. See the [`pipeline`] module.

// Re-export approx traits for users who want to compare float outputs
pub use approx;

pub mod boundaries;
pub mod config;
pub mod discretizer;
pub mod encode;
pub mod error;
pub mod parallel;
pub mod persist;
pub mod pipeline;
pub mod summary;
pub mod tensor;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use discretizer::{BinSource, BinState, Discretizer};

pub use config::DiscretizerConfig;
pub use encode::{DType, OutputMode};

pub use boundaries::Boundaries;
pub use summary::{QuantileSummary, DEFAULT_EPSILON};

pub use tensor::{Encoded, SparseTensor, Tensor};

pub use error::{DiscretizeError, Result};
pub use persist::{LoadError, SaveError};

pub use pipeline::{SliceDataset, Transform, TransformExt};

pub use parallel::{run_with_threads, Parallelism};
