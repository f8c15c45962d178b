//! Dense and sparse tensor representations.
//!
//! The discretizer accepts either representation through [`Tensor`] and picks
//! the matching code path by inspecting the variant.
//!
//! - [`Tensor::Dense`]: an n-dimensional `ndarray` array.
//! - [`Tensor::Sparse`]: a coordinate list ([`SparseTensor`]) of stored values
//!   plus the logical shape. Entries that are not stored are implicit zeros.

use std::collections::BTreeMap;

use ndarray::{ArrayD, Dimension, IxDyn};

use crate::error::{DiscretizeError, Result};

// =============================================================================
// SparseTensor
// =============================================================================

/// Coordinate-list (COO) sparse tensor.
///
/// Coordinates are kept in lexicographic order and are unique.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseTensor<T> {
    indices: Vec<Vec<usize>>,
    values: Vec<T>,
    shape: Vec<usize>,
}

impl<T> SparseTensor<T> {
    /// Build a sparse tensor from coordinates and values.
    ///
    /// Coordinates may come in any order. Fails with a shape error if the
    /// lengths disagree, a coordinate has the wrong rank or lies outside
    /// `shape`, or a coordinate repeats.
    pub fn new(indices: Vec<Vec<usize>>, values: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(DiscretizeError::shape(format!(
                "sparse tensor has {} coordinates but {} values",
                indices.len(),
                values.len()
            )));
        }
        for coord in &indices {
            if coord.len() != shape.len() {
                return Err(DiscretizeError::shape(format!(
                    "coordinate {coord:?} has rank {}, tensor has rank {}",
                    coord.len(),
                    shape.len()
                )));
            }
            if coord.iter().zip(&shape).any(|(&c, &dim)| c >= dim) {
                return Err(DiscretizeError::shape(format!(
                    "coordinate {coord:?} out of bounds for shape {shape:?}"
                )));
            }
        }

        let mut entries: Vec<(Vec<usize>, T)> = indices.into_iter().zip(values).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DiscretizeError::shape(format!(
                "duplicate sparse coordinate {:?}",
                pair[0].0
            )));
        }

        let (indices, values) = entries.into_iter().unzip();
        Ok(Self {
            indices,
            values,
            shape,
        })
    }

    /// Build from already sorted, unique, in-bounds entries.
    pub(crate) fn from_sorted_map(map: BTreeMap<Vec<usize>, T>, shape: Vec<usize>) -> Self {
        let (indices, values) = map.into_iter().unzip();
        Self {
            indices,
            values,
            shape,
        }
    }

    /// Logical shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over `(coordinate, value)` pairs in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (&[usize], &T)> {
        self.indices
            .iter()
            .map(Vec::as_slice)
            .zip(self.values.iter())
    }

    /// Transform stored values, keeping the sparsity pattern.
    pub fn map_values<U>(&self, f: impl FnMut(&T) -> U) -> SparseTensor<U> {
        SparseTensor {
            indices: self.indices.clone(),
            values: self.values.iter().map(f).collect(),
            shape: self.shape.clone(),
        }
    }
}

impl<T: Clone + Default + PartialEq> SparseTensor<T> {
    /// Convert a dense array, storing only entries that differ from
    /// `T::default()`.
    ///
    /// NaN values are stored (they never compare equal to zero).
    pub fn from_dense(dense: &ArrayD<T>) -> Self {
        let zero = T::default();
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (idx, v) in dense.indexed_iter() {
            if *v != zero {
                indices.push(idx.slice().to_vec());
                values.push(v.clone());
            }
        }
        // `indexed_iter` walks in logical (row-major) order, which is
        // lexicographic.
        Self {
            indices,
            values,
            shape: dense.shape().to_vec(),
        }
    }

    /// Materialize as a dense array, filling implicit entries with
    /// `T::default()`.
    pub fn to_dense(&self) -> ArrayD<T> {
        let mut dense = ArrayD::from_elem(IxDyn(&self.shape), T::default());
        for (coord, v) in self.iter() {
            dense[coord] = v.clone();
        }
        dense
    }
}

// =============================================================================
// Tensor
// =============================================================================

/// A dense or sparse tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum Tensor<T = f64> {
    Dense(ArrayD<T>),
    Sparse(SparseTensor<T>),
}

impl<T> Tensor<T> {
    /// Logical shape.
    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::Dense(a) => a.shape(),
            Tensor::Sparse(s) => s.shape(),
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    #[inline]
    pub fn is_sparse(&self) -> bool {
        matches!(self, Tensor::Sparse(_))
    }

    /// Dense array, if this is a dense tensor.
    pub fn as_dense(&self) -> Option<&ArrayD<T>> {
        match self {
            Tensor::Dense(a) => Some(a),
            Tensor::Sparse(_) => None,
        }
    }

    /// Sparse tensor, if this is a sparse tensor.
    pub fn as_sparse(&self) -> Option<&SparseTensor<T>> {
        match self {
            Tensor::Dense(_) => None,
            Tensor::Sparse(s) => Some(s),
        }
    }
}

impl<T: Clone + Default + PartialEq> Tensor<T> {
    /// Dense view of the data, materializing sparse tensors.
    pub fn to_dense(&self) -> ArrayD<T> {
        match self {
            Tensor::Dense(a) => a.clone(),
            Tensor::Sparse(s) => s.to_dense(),
        }
    }
}

impl Tensor<f64> {
    /// Build a dense tensor from a flat row-major buffer.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(Tensor::Dense)
            .map_err(|e| DiscretizeError::shape(format!("cannot build tensor of shape {shape:?}: {e}")))
    }

    /// Iterate over stored scalar values (all values for dense tensors).
    pub(crate) fn stored_values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Tensor::Dense(a) => Box::new(a.iter().copied()),
            Tensor::Sparse(s) => Box::new(s.values().iter().copied()),
        }
    }
}

impl<T, D: Dimension> From<ndarray::Array<T, D>> for Tensor<T> {
    fn from(array: ndarray::Array<T, D>) -> Self {
        Tensor::Dense(array.into_dyn())
    }
}

impl<T> From<SparseTensor<T>> for Tensor<T> {
    fn from(sparse: SparseTensor<T>) -> Self {
        Tensor::Sparse(sparse)
    }
}

// =============================================================================
// Encoded
// =============================================================================

/// Output of a discretizer: integer or floating point, dense or sparse.
///
/// The element kind follows the layer's [`DType`](crate::DType).
#[derive(Clone, Debug, PartialEq)]
pub enum Encoded {
    Int(Tensor<i64>),
    Float(Tensor<f64>),
}

impl Encoded {
    /// Logical shape.
    pub fn shape(&self) -> &[usize] {
        match self {
            Encoded::Int(t) => t.shape(),
            Encoded::Float(t) => t.shape(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        match self {
            Encoded::Int(t) => t.is_sparse(),
            Encoded::Float(t) => t.is_sparse(),
        }
    }

    /// Integer tensor, if the output is integer-typed.
    pub fn as_int(&self) -> Option<&Tensor<i64>> {
        match self {
            Encoded::Int(t) => Some(t),
            Encoded::Float(_) => None,
        }
    }

    /// Float tensor, if the output is float-typed.
    pub fn as_float(&self) -> Option<&Tensor<f64>> {
        match self {
            Encoded::Int(_) => None,
            Encoded::Float(t) => Some(t),
        }
    }

    /// Dense `f64` copy of the output regardless of kind or layout.
    pub fn to_dense_f64(&self) -> ArrayD<f64> {
        match self {
            Encoded::Int(t) => t.to_dense().mapv(|v| v as f64),
            Encoded::Float(t) => t.to_dense(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sparse_sorts_coordinates() {
        let s = SparseTensor::new(
            vec![vec![1, 0], vec![0, 2]],
            vec![5.0, 3.0],
            vec![2, 3],
        )
        .unwrap();
        assert_eq!(s.indices(), &[vec![0, 2], vec![1, 0]]);
        assert_eq!(s.values(), &[3.0, 5.0]);
    }

    #[test]
    fn sparse_rejects_out_of_bounds() {
        let err = SparseTensor::new(vec![vec![0, 3]], vec![1.0], vec![2, 3]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn sparse_rejects_wrong_rank() {
        let err = SparseTensor::new(vec![vec![0]], vec![1.0], vec![2, 3]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn sparse_rejects_duplicates() {
        let err =
            SparseTensor::new(vec![vec![0, 1], vec![0, 1]], vec![1.0, 2.0], vec![2, 3]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn sparse_rejects_length_mismatch() {
        let err = SparseTensor::new(vec![vec![0, 1]], vec![1.0, 2.0], vec![2, 3]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn dense_sparse_dense() {
        let dense = array![[0.0, 1.5, 0.0], [-2.0, 0.0, 0.0]].into_dyn();
        let sparse = SparseTensor::from_dense(&dense);
        assert_eq!(sparse.nnz(), 2);
        assert_eq!(sparse.indices(), &[vec![0, 1], vec![1, 0]]);
        assert_eq!(sparse.to_dense(), dense);
    }

    #[test]
    fn from_shape_vec_checks_length() {
        let err = Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.is_shape());
        let t = Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.shape(), &[2, 2]);
    }
}
