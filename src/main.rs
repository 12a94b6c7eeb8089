#![recursion_limit = "256"]

use burn::backend::Autodiff;
use burn::data::dataset::Dataset;
use burn::optim::AdamConfig;
use burn::prelude::*;

use mnist_mlp::data::{self, HEIGHT, WIDTH};
use mnist_mlp::evaluate::evaluate;
use mnist_mlp::model::MlpConfig;
use mnist_mlp::training::{self, TrainingConfig};

static ARTIFACT_DIR: &str = "/tmp/mnist-mlp";

/// Runs the full pipeline on one backend: load, train, evaluate, report.
fn pipeline<B: Backend>(device: B::Device) {
    let (dataset_train, dataset_test) = data::load();

    let num_train = dataset_train.len();
    let num_test = dataset_test.len();
    println!("Shape of x_train = [{num_train}, {HEIGHT}, {WIDTH}]");
    println!("Shape of y_train = [{num_train}]");
    println!("Shape of x_test = [{num_test}, {HEIGHT}, {WIDTH}]");
    println!("Shape of y_test = [{num_test}]");

    let config = TrainingConfig::new(MlpConfig::new(), AdamConfig::new());
    let batch_size = config.batch_size;

    let model =
        training::run::<Autodiff<B>, _>(ARTIFACT_DIR, config, dataset_train, device.clone());

    let report = evaluate(&model, dataset_test, batch_size, &device);
    println!("Test loss = {}  Test accuracy = {}", report.loss, report.accuracy);
}

#[cfg(feature = "ndarray")]
mod ndarray {
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    pub fn run() {
        super::pipeline::<NdArray>(NdArrayDevice::Cpu);
    }
}

#[cfg(all(feature = "wgpu", not(feature = "ndarray")))]
mod wgpu {
    use burn::backend::wgpu::{Wgpu, WgpuDevice};

    pub fn run() {
        super::pipeline::<Wgpu>(WgpuDevice::default());
    }
}

fn main() {
    env_logger::init();

    #[cfg(feature = "ndarray")]
    ndarray::run();
    #[cfg(all(feature = "wgpu", not(feature = "ndarray")))]
    wgpu::run();
}
