use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
    tensor::{activation, backend::AutodiffBackend},
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};

use crate::data::{MnistBatch, NUM_PIXELS};

/// The classifier: two relu-activated hidden layers and a linear output
/// head over the 10 digit classes. Softmax is applied by the probability
/// and loss paths, not stored in the module.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    linear1: Linear<B>,
    linear2: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

#[derive(Config, Debug)]
pub struct MlpConfig {
    #[config(default = 32)]
    pub hidden_size: usize,
    #[config(default = 10)]
    pub num_classes: usize,
}

impl MlpConfig {
    /// Initializes the network with the framework's default weight
    /// initialization on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            linear1: LinearConfig::new(NUM_PIXELS, self.hidden_size).init(device),
            linear2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> Mlp<B> {
    /// Maps flattened images `[batch_size, 784]` to logits
    /// `[batch_size, num_classes]`.
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.linear1.forward(images));
        let x = self.activation.forward(self.linear2.forward(x));
        self.output.forward(x)
    }

    /// Like [`Mlp::forward`] but with softmax applied, so every row is a
    /// probability distribution over the classes.
    pub fn forward_probabilities(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::softmax(self.forward(images), 1)
    }

    pub fn forward_classification(&self, batch: MnistBatch<B>) -> ClassificationOutput<B> {
        let logits = self.forward(batch.images);
        let loss = categorical_cross_entropy(logits.clone(), batch.targets_one_hot);

        ClassificationOutput::new(loss, logits, batch.targets)
    }
}

/// Mean categorical cross-entropy between one-hot targets and logits,
/// computed as `-(targets * log_softmax(logits)).sum(classes).mean()`.
/// Equivalent to cross-entropy on a softmax output head.
fn categorical_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets_one_hot: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let log_probabilities = activation::log_softmax(logits, 1);
    (targets_one_hot * log_probabilities).sum_dim(1).mean().neg()
}

impl<B: AutodiffBackend> TrainStep<MnistBatch<B>, ClassificationOutput<B>> for Mlp<B> {
    fn step(&self, batch: MnistBatch<B>) -> TrainOutput<ClassificationOutput<B>> {
        let item = self.forward_classification(batch);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<MnistBatch<B>, ClassificationOutput<B>> for Mlp<B> {
    fn step(&self, batch: MnistBatch<B>) -> ClassificationOutput<B> {
        self.forward_classification(batch)
    }
}
