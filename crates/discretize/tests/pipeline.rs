//! Running a discretizer inside a batched pipeline.

use discretize::pipeline::transform_all;
use discretize::{
    Discretizer, Encoded, OutputMode, Parallelism, SliceDataset, Tensor, Transform, TransformExt,
};
use ndarray::{array, Array2, Axis};

fn layer(mode: OutputMode) -> Discretizer {
    Discretizer::with_boundaries(vec![0.0, 0.35, 0.5, 1.0], mode).unwrap()
}

#[test]
fn pipeline_output_equals_eager() {
    let data = array![[-1.0, 0.0, 0.1, 0.2, 0.4, 0.5, 1.0, 1.2, 0.98]];
    let layer = layer(OutputMode::Int);

    let outputs: Vec<Encoded> = SliceDataset::from_tensor_slices(data)
        .unwrap()
        .batch(1)
        .unwrap()
        .map_transform(&layer)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        outputs,
        vec![Encoded::Int(Tensor::from(array![[0i64, 1, 1, 1, 2, 3, 4, 4, 3]]))]
    );
}

#[test]
fn batched_outputs_concatenate_to_eager() {
    let data = Array2::from_shape_fn((10, 3), |(i, j)| (i * 3 + j) as f64 / 20.0 - 0.2);
    let layer = layer(OutputMode::MultiHot);
    let eager = layer.apply(&Tensor::from(data.clone())).unwrap().to_dense_f64();

    let ds = SliceDataset::from_tensor_slices(data).unwrap();
    let parts: Vec<_> = ds
        .batch(4)
        .unwrap()
        .map_transform(&layer)
        .map(|r| r.unwrap().to_dense_f64())
        .collect();
    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    let stitched = ndarray::concatenate(Axis(0), &views).unwrap();

    assert_eq!(stitched, eager);
}

#[test]
fn transform_trait_object() {
    let transforms: Vec<Box<dyn Transform>> = vec![
        Box::new(layer(OutputMode::Int)),
        Box::new(layer(OutputMode::OneHot)),
    ];
    let batch = Tensor::from(array![0.4, 0.9]);
    let shapes: Vec<Vec<usize>> = transforms
        .iter()
        .map(|t| t.transform(&batch).unwrap().shape().to_vec())
        .collect();
    assert_eq!(shapes, vec![vec![2], vec![2, 5]]);
}

#[test]
fn transform_all_keeps_order() {
    let data = Array2::from_shape_fn((40, 2), |(i, j)| i as f64 / 40.0 + j as f64);
    let ds = SliceDataset::from_tensor_slices(data).unwrap();
    let batches: Vec<Tensor> = ds.batch(3).unwrap().collect();
    let layer = layer(OutputMode::Count);

    let sequential: Vec<Encoded> = batches.iter().map(|b| layer.apply(b).unwrap()).collect();
    let parallel = transform_all(&batches, &layer, Parallelism::Parallel).unwrap();
    assert_eq!(parallel, sequential);
}
