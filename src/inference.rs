use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::{data::MnistBatcher, training::TrainingConfig};

/// Rebuilds the trained model from `artifact_dir` and classifies one item,
/// printing the predicted and expected labels.
pub fn infer<B: Backend>(artifact_dir: &str, device: B::Device, item: MnistItem) {
    let config = TrainingConfig::load(format!("{artifact_dir}/config.json"))
        .expect("config should exist for the model; run training first");
    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), &device)
        .expect("trained model should exist; run training first");

    let model = config.model.init::<B>(&device).load_record(record);

    let label = item.label;
    let batcher = MnistBatcher::default();
    let batch = batcher.batch(vec![item], &device);
    let output = model.forward_probabilities(batch.images);
    let predicted: i64 = output.argmax(1).flatten::<1>(0, 1).into_scalar().elem();

    println!("Predicted {predicted} Expected {label}");
}
