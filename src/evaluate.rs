use burn::{
    data::{
        dataloader::DataLoaderBuilder,
        dataset::{Dataset, vision::MnistItem},
    },
    prelude::*,
};

use crate::{data::MnistBatcher, model::Mlp};

/// Aggregate metrics of a forward-only pass over a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestReport {
    /// Item-weighted mean categorical cross-entropy. Never negative.
    pub loss: f64,
    /// Fraction of items whose argmax matches the label, in [0, 1].
    pub accuracy: f64,
}

/// Runs the model over `dataset` without weight updates and aggregates loss
/// and accuracy.
///
/// Partial trailing batches are weighted by their actual size, so the result
/// is independent of `batch_size`. Panics if the aggregate loss is not
/// finite, which is how a diverged training run surfaces here.
pub fn evaluate<B: Backend, D: Dataset<MnistItem> + 'static>(
    model: &Mlp<B>,
    dataset: D,
    batch_size: usize,
    device: &B::Device,
) -> TestReport {
    let num_items = dataset.len();
    assert!(num_items > 0, "cannot evaluate on an empty dataset");

    let dataloader = DataLoaderBuilder::new(MnistBatcher::default())
        .batch_size(batch_size)
        .num_workers(1)
        .set_device(device.clone())
        .build(dataset);

    let mut summed_loss = 0.0;
    let mut num_correct: i64 = 0;

    for batch in dataloader.iter() {
        let targets = batch.targets.clone();
        let output = model.forward_classification(batch);
        let [current_batch_size, _num_classes] = output.output.dims();

        summed_loss += output.loss.into_scalar().elem::<f64>() * current_batch_size as f64;
        num_correct += output
            .output
            .argmax(1)
            .reshape([current_batch_size])
            .equal(targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
    }

    let loss = summed_loss / num_items as f64;
    assert!(
        loss.is_finite(),
        "test loss is not finite ({loss}); the run diverged"
    );

    TestReport {
        loss,
        accuracy: num_correct as f64 / num_items as f64,
    }
}
