use std::sync::Arc;

use burn::{
    data::{
        dataloader::DataLoaderBuilder,
        dataset::{Dataset, transform::PartialDataset, vision::MnistItem},
    },
    module::AutodiffModule,
    optim::AdamConfig,
    prelude::*,
    record::CompactRecorder,
    tensor::backend::AutodiffBackend,
    train::{
        LearnerBuilder,
        metric::{AccuracyMetric, LossMetric},
    },
};

use crate::{
    data::MnistBatcher,
    model::{Mlp, MlpConfig},
};

#[derive(Config)]
pub struct TrainingConfig {
    pub model: MlpConfig,
    pub optimizer: AdamConfig,
    #[config(default = 5)]
    pub num_epochs: usize,
    #[config(default = 128)]
    pub batch_size: usize,
    /// Fraction of the training set held out for validation, carved off the
    /// tail before any shuffling. Only the training head is shuffled.
    #[config(default = 0.3)]
    pub validation_split: f64,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = 4)]
    pub num_workers: usize,
}

/// Index of the first held-out item for a given set size and split fraction.
fn split_index(num_items: usize, validation_split: f64) -> usize {
    (num_items as f64 * (1.0 - validation_split)) as usize
}

fn create_artifact_dir(artifact_dir: &str) {
    // Remove existing artifacts
    std::fs::remove_dir_all(artifact_dir).ok();
    std::fs::create_dir_all(artifact_dir).ok();
}

/// Trains the classifier and returns it with autodiff stripped, ready for
/// evaluation or inference.
///
/// Writes `config.json`, checkpoints and the final `model` record under
/// `artifact_dir`; per-epoch metrics are rendered by the learner while it
/// runs. Any failure (dataset exhaustion, non-finite loss, unwritable
/// artifacts) is fatal and propagates.
pub fn run<B: AutodiffBackend, D: Dataset<MnistItem> + 'static>(
    artifact_dir: &str,
    config: TrainingConfig,
    dataset_train: D,
    device: B::Device,
) -> Mlp<B::InnerBackend> {
    create_artifact_dir(artifact_dir);
    config
        .save(format!("{artifact_dir}/config.json"))
        .expect("config should be writable to the artifact dir");

    B::seed(config.seed);

    let dataset_train = Arc::new(dataset_train);
    let num_items = dataset_train.len();
    let split = split_index(num_items, config.validation_split);
    assert!(
        split > 0 && split < num_items,
        "validation_split {} leaves an empty partition for {num_items} items",
        config.validation_split
    );
    log::info!(
        "fitting on {split} samples, validating on {} samples",
        num_items - split
    );

    let dataset_valid = PartialDataset::new(dataset_train.clone(), split, num_items);
    let dataset_train = PartialDataset::new(dataset_train, 0, split);

    let batcher = MnistBatcher::default();

    let dataloader_train = DataLoaderBuilder::new(batcher.clone())
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(dataset_train);

    let dataloader_valid = DataLoaderBuilder::new(batcher)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .build(dataset_valid);

    let learner = LearnerBuilder::new(artifact_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(vec![device.clone()])
        .num_epochs(config.num_epochs)
        .summary()
        .build(
            config.model.init::<B>(&device),
            config.optimizer.init(),
            config.learning_rate,
        );

    let model_trained = learner.fit(dataloader_train, dataloader_valid);

    model_trained
        .clone()
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())
        .expect("trained model should be saved successfully");
    log::info!("artifacts written to {artifact_dir}");

    model_trained.valid()
}
