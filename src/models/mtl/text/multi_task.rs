//! Adapt the joint model to the Multi-Task pipeline

use burn::{
    tensor::backend::{AutodiffBackend, Backend},
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};

use crate::pipelines::multi_task::Train;

use super::Model;

/// Define training step
impl<B: AutodiffBackend> TrainStep<Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, item: Train<B>) -> TrainOutput<ClassificationOutput<B>> {
        let output = self.forward(item);
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

/// Define validation step
impl<B: Backend> ValidStep<Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, item: Train<B>) -> ClassificationOutput<B> {
        self.forward(item)
    }
}
