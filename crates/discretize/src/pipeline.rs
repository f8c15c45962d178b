//! Streaming pipeline integration.
//!
//! A [`Transform`] maps one batch to one output with no state carried
//! between batches, so the same layer can run over any stream of batches.
//!
//! ```
//! use discretize::pipeline::{SliceDataset, TransformExt};
//! use discretize::{Discretizer, OutputMode};
//! use ndarray::array;
//!
//! let layer = Discretizer::with_boundaries(vec![0.0, 0.5, 1.0], OutputMode::Int).unwrap();
//! let dataset = SliceDataset::from_tensor_slices(array![[-1.0], [0.1], [0.8], [1.2]]).unwrap();
//!
//! let outputs: Vec<_> = dataset
//!     .batch(2)
//!     .unwrap()
//!     .map_transform(&layer)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(outputs.len(), 2);
//! ```

use ndarray::{Array, ArrayD, ArrayViewD, Axis, Dimension, Slice};

use crate::discretizer::Discretizer;
use crate::error::{DiscretizeError, Result};
use crate::parallel::Parallelism;
use crate::tensor::{Encoded, Tensor};

// =============================================================================
// Transform
// =============================================================================

/// A per-batch transform.
pub trait Transform: Send + Sync {
    /// Transform one batch.
    fn transform(&self, input: &Tensor) -> Result<Encoded>;
}

impl Transform for Discretizer {
    fn transform(&self, input: &Tensor) -> Result<Encoded> {
        self.apply(input)
    }
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn transform(&self, input: &Tensor) -> Result<Encoded> {
        (**self).transform(input)
    }
}

// =============================================================================
// SliceDataset
// =============================================================================

/// In-memory dataset whose elements are the slices of an array along its
/// first axis.
#[derive(Clone, Debug)]
pub struct SliceDataset {
    data: ArrayD<f64>,
}

impl SliceDataset {
    /// One element per index of the first axis of `data`.
    ///
    /// Scalars have no first axis and are rejected.
    pub fn from_tensor_slices<D: Dimension>(data: Array<f64, D>) -> Result<Self> {
        if data.ndim() == 0 {
            return Err(DiscretizeError::shape(
                "from_tensor_slices needs an input of rank >= 1",
            ));
        }
        Ok(Self {
            data: data.into_dyn(),
        })
    }

    /// Stack individual rows into a dataset. All rows must share one shape.
    pub fn from_rows(rows: &[ArrayD<f64>]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| DiscretizeError::shape("cannot build a dataset from zero rows"))?;
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.shape() != first.shape())
        {
            return Err(DiscretizeError::shape(format!(
                "row {i} has shape {:?}, expected {:?}",
                row.shape(),
                first.shape()
            )));
        }
        let views: Vec<ArrayViewD<'_, f64>> = rows.iter().map(|r| r.view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| DiscretizeError::shape(format!("cannot stack rows: {e}")))?;
        Ok(Self { data })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a single row.
    pub fn row_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }

    /// Row `index`, if in range.
    pub fn get(&self, index: usize) -> Option<Tensor> {
        (index < self.len()).then(|| Tensor::Dense(self.data.index_axis(Axis(0), index).to_owned()))
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = Tensor> + '_ {
        self.data
            .axis_iter(Axis(0))
            .map(|row| Tensor::Dense(row.to_owned()))
    }

    /// Group consecutive rows into batches of `batch_size`. The last batch
    /// holds the remainder and may be smaller.
    pub fn batch(&self, batch_size: usize) -> Result<Batches<'_>> {
        if batch_size == 0 {
            return Err(DiscretizeError::config("batch_size must be >= 1"));
        }
        Ok(Batches {
            data: &self.data,
            batch_size,
            start: 0,
        })
    }
}

/// Iterator over batches of a [`SliceDataset`].
#[derive(Clone, Debug)]
pub struct Batches<'a> {
    data: &'a ArrayD<f64>,
    batch_size: usize,
    start: usize,
}

impl Iterator for Batches<'_> {
    type Item = Tensor;

    fn next(&mut self) -> Option<Tensor> {
        let n = self.data.len_of(Axis(0));
        if self.start >= n {
            return None;
        }
        let end = (self.start + self.batch_size).min(n);
        let batch = self
            .data
            .slice_axis(Axis(0), Slice::from(self.start..end))
            .to_owned();
        self.start = end;
        Some(Tensor::Dense(batch))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len_of(Axis(0)).saturating_sub(self.start);
        let n = remaining.div_ceil(self.batch_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}

// =============================================================================
// Mapping
// =============================================================================

/// Iterator adapter returned by [`TransformExt::map_transform`].
pub struct MapTransform<'t, I, T: ?Sized> {
    batches: I,
    transform: &'t T,
}

impl<I, T> Iterator for MapTransform<'_, I, T>
where
    I: Iterator<Item = Tensor>,
    T: Transform + ?Sized,
{
    type Item = Result<Encoded>;

    fn next(&mut self) -> Option<Self::Item> {
        self.batches
            .next()
            .map(|batch| self.transform.transform(&batch))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.batches.size_hint()
    }
}

/// Adds `map_transform` to any stream of batches.
pub trait TransformExt: Iterator<Item = Tensor> + Sized {
    /// Apply `transform` to every batch, lazily.
    fn map_transform<T: Transform + ?Sized>(self, transform: &T) -> MapTransform<'_, Self, T> {
        MapTransform {
            batches: self,
            transform,
        }
    }
}

impl<I: Iterator<Item = Tensor>> TransformExt for I {}

/// Transform a materialized list of batches, in parallel when allowed.
///
/// Outputs keep batch order. The first failing batch aborts the call.
pub fn transform_all<T: Transform + ?Sized>(
    batches: &[Tensor],
    transform: &T,
    parallelism: Parallelism,
) -> Result<Vec<Encoded>> {
    parallelism
        .maybe_par_map(batches, |batch| transform.transform(batch))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::OutputMode;
    use ndarray::{array, Array1};

    fn layer() -> Discretizer {
        Discretizer::with_boundaries(vec![0.0, 0.35, 0.5, 1.0], OutputMode::Int).unwrap()
    }

    #[test]
    fn rejects_scalar() {
        let err = SliceDataset::from_tensor_slices(ndarray::arr0(1.0)).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn rows_and_shape() {
        let ds = SliceDataset::from_tensor_slices(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.row_shape(), &[2]);
        assert_eq!(ds.get(1), Some(Tensor::from(array![3.0, 4.0])));
        assert_eq!(ds.get(3), None);
        assert_eq!(ds.rows().count(), 3);
    }

    #[test]
    fn batches_keep_remainder() {
        let ds = SliceDataset::from_tensor_slices(Array1::range(0.0, 5.0, 1.0)).unwrap();
        let batches = ds.batch(2).unwrap();
        assert_eq!(batches.len(), 3);
        let shapes: Vec<Vec<usize>> = batches.map(|b| b.shape().to_vec()).collect();
        assert_eq!(shapes, vec![vec![2], vec![2], vec![1]]);
        assert!(ds.batch(0).is_err());
    }

    #[test]
    fn from_rows_checks_shapes() {
        let rows = vec![array![1.0, 2.0].into_dyn(), array![3.0].into_dyn()];
        assert!(SliceDataset::from_rows(&rows).unwrap_err().is_shape());
        assert!(SliceDataset::from_rows(&[]).unwrap_err().is_shape());

        let rows = vec![array![1.0, 2.0].into_dyn(), array![3.0, 4.0].into_dyn()];
        let ds = SliceDataset::from_rows(&rows).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn pipeline_matches_eager() {
        let input = array![[-1.0, 0.0, 0.1, 0.2, 0.4, 0.5, 1.0, 1.2, 0.98]];
        let layer = layer();
        let eager = layer.apply(&Tensor::from(input.clone())).unwrap();

        let ds = SliceDataset::from_tensor_slices(input).unwrap();
        let out: Vec<Encoded> = ds
            .batch(1)
            .unwrap()
            .map_transform(&layer)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out, vec![eager.clone()]);
        assert_eq!(
            eager.as_int().and_then(Tensor::as_dense).unwrap(),
            &array![[0i64, 1, 1, 1, 2, 3, 4, 4, 3]].into_dyn()
        );
    }

    #[test]
    fn map_transform_surfaces_errors() {
        let unadapted = Discretizer::with_num_bins(3, OutputMode::Int).unwrap();
        let ds = SliceDataset::from_tensor_slices(array![1.0, 2.0]).unwrap();
        let first = ds.batch(1).unwrap().map_transform(&unadapted).next().unwrap();
        assert!(first.unwrap_err().is_configuration());
    }

    #[test]
    fn transform_all_parallel() {
        let ds = SliceDataset::from_tensor_slices(Array1::linspace(-1.0, 2.0, 64)).unwrap();
        let batches: Vec<Tensor> = ds.batch(8).unwrap().collect();
        let boxed: Box<dyn Transform> = Box::new(layer());
        let seq = transform_all(&batches, &boxed, Parallelism::Sequential).unwrap();
        let par = transform_all(&batches, &boxed, Parallelism::Parallel).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 8);
    }
}
