//! Sparse inputs: only stored values are bucketed.

use discretize::{Discretizer, DiscretizerConfig, OutputMode, SparseTensor, Tensor};
use ndarray::array;

fn sparse(indices: &[[usize; 2]], values: &[f64], shape: [usize; 2]) -> Tensor {
    Tensor::from(
        SparseTensor::new(
            indices.iter().map(|c| c.to_vec()).collect(),
            values.to_vec(),
            shape.to_vec(),
        )
        .unwrap(),
    )
}

fn layer(mode: OutputMode) -> Discretizer {
    Discretizer::with_boundaries(vec![0.0, 0.5, 1.0], mode).unwrap()
}

#[test]
fn int_keeps_pattern() {
    let input = sparse(
        &[[0, 0], [0, 1], [0, 2], [0, 3]],
        &[-1.0, 0.2, 0.7, 1.2],
        [1, 4],
    );
    let out = layer(OutputMode::Int).apply(&input).unwrap();
    assert!(out.is_sparse());

    let ints = out.as_int().and_then(Tensor::as_sparse).unwrap();
    assert_eq!(ints.values(), &[0, 1, 2, 3]);
    assert_eq!(out.to_dense_f64(), array![[0.0, 1.0, 2.0, 3.0]].into_dyn());
}

#[test]
fn implicit_entries_stay_implicit() {
    // Implicit zeros would fall into bucket 1; they must not show up.
    let input = sparse(&[[0, 2], [1, 0]], &[0.7, -3.0], [2, 3]);
    let out = layer(OutputMode::MultiHot).apply(&input).unwrap();

    let sp = out.as_float().and_then(Tensor::as_sparse).unwrap();
    assert_eq!(sp.shape(), &[2, 4]);
    assert_eq!(sp.indices(), &[vec![0, 2], vec![1, 0]]);
    assert_eq!(sp.values(), &[1.0, 1.0]);
}

#[test]
fn count_aggregates_per_row() {
    let input = sparse(&[[0, 0], [0, 1], [0, 2], [1, 1]], &[0.6, 0.9, 2.0, 0.6], [2, 3]);
    let out = layer(OutputMode::Count).apply(&input).unwrap();
    assert_eq!(
        out.to_dense_f64(),
        array![[0.0, 0.0, 2.0, 1.0], [0.0, 0.0, 1.0, 0.0]].into_dyn()
    );
}

#[test]
fn one_hot_appends_axis() {
    let input = sparse(&[[1, 1]], &[0.2], [2, 2]);
    let out = layer(OutputMode::OneHot).apply(&input).unwrap();
    let sp = out.as_float().and_then(Tensor::as_sparse).unwrap();
    assert_eq!(sp.shape(), &[2, 2, 4]);
    assert_eq!(sp.indices(), &[vec![1, 1, 1]]);
}

#[test]
fn dense_input_sparse_output() {
    let config = DiscretizerConfig::builder()
        .bin_boundaries(vec![0.0, 0.5, 1.0])
        .output_mode(OutputMode::OneHot)
        .sparse(true)
        .build();
    let layer = Discretizer::new(config).unwrap();
    let out = layer.apply(&Tensor::from(array![0.1, 0.8])).unwrap();

    let sp = out.as_float().and_then(Tensor::as_sparse).unwrap();
    assert_eq!(sp.nnz(), 2);
    assert_eq!(
        out.to_dense_f64(),
        array![[0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]].into_dyn()
    );
}

#[test]
fn malformed_sparse_input() {
    let bad_rank = SparseTensor::new(vec![vec![0]], vec![1.0], vec![2, 2]);
    assert!(bad_rank.unwrap_err().is_shape());

    let out_of_bounds = SparseTensor::new(vec![vec![0, 5]], vec![1.0], vec![2, 2]);
    assert!(out_of_bounds.unwrap_err().is_shape());

    let duplicate = SparseTensor::new(vec![vec![0, 1], vec![0, 1]], vec![1.0, 2.0], vec![2, 2]);
    assert!(duplicate.unwrap_err().is_shape());
}

#[test]
fn adapt_on_sparse_uses_stored_values_only() {
    let input = sparse(
        &[[0, 0], [1, 0], [2, 0], [3, 0]],
        &[10.0, 20.0, 30.0, 40.0],
        [4, 100],
    );
    let mut layer = Discretizer::with_num_bins(2, OutputMode::Int).unwrap();
    layer.adapt(&input).unwrap();
    assert_eq!(layer.bin_boundaries(), Some(&[20.0][..]));
}
