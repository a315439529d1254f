//! Adapt the memory-network CNN to the Relation Classification pipeline

use burn::{
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};

use crate::{
    datasets::Embeddings,
    pipelines::relation_classification::{self, batcher},
};

use super::{Config, Model};

/// Define training step
impl<B: AutodiffBackend> TrainStep<batcher::Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, item: batcher::Train<B>) -> TrainOutput<ClassificationOutput<B>> {
        let output = if self.adversarial {
            self.forward_adversarial(item)
        } else {
            self.forward(item)
        };
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

/// Define validation step
impl<B: Backend> ValidStep<batcher::Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, item: batcher::Train<B>) -> ClassificationOutput<B> {
        self.forward(item)
    }
}

impl<B: Backend> relation_classification::Model<B> for Model<B> {
    type Config = Config;

    fn init(config: &Self::Config, embeddings: Option<&Embeddings>, device: &B::Device) -> Self {
        config.init(embeddings, device)
    }

    fn classify(&self, input: batcher::Infer<B>) -> Tensor<B, 2> {
        self.infer(input)
    }
}

impl relation_classification::ModelConfig for Config {
    fn for_vocabulary(vocab_size: usize, word_dim: usize, num_classes: usize) -> Self {
        // 50-dimensional SENNA vectors are fine-tuned, larger tables stay frozen
        Config::new(vocab_size, word_dim, num_classes).with_tune_word_embed(word_dim == 50)
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::batcher::Batcher as _,
    };
    use pretty_assertions::assert_eq;

    use crate::{
        datasets::{relations::Item, Vocabulary},
        pipelines::relation_classification::{Batcher, Model as _, ModelConfig as _},
    };

    use super::*;

    type TestAutodiffBackend = Autodiff<NdArray>;

    fn batch<B: Backend>(device: &B::Device) -> batcher::Train<B> {
        let vocab = Vocabulary::new(
            ["<pad>", "a", "cat", "house", "in", "sat", "the"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
        .unwrap();
        let batcher = Batcher::<B>::new(vocab, 8, device.clone());

        batcher.batch(vec![
            "1 1 1 5 5 the cat sat in the house".parse::<Item>().unwrap(),
            "2 0 0 1 1 a cat".parse::<Item>().unwrap(),
        ])
    }

    fn config() -> Config {
        Config::new(7, 4, 3)
            .with_max_len(8)
            .with_num_filters(3)
            .with_pos_dim(2)
    }

    #[test]
    fn test_word_embeddings_are_tuned_only_for_small_tables() {
        assert!(Config::for_vocabulary(10, 50, 19).tune_word_embed);
        assert!(!Config::for_vocabulary(10, 300, 19).tune_word_embed);
    }

    #[test]
    fn test_classify_returns_class_probabilities() {
        let device = Default::default();
        let model: Model<NdArray> = Model::init(&config(), None, &device);

        let probs = model.classify(batch::<NdArray>(&device).input);

        assert_eq!(probs.dims(), [2, 3]);
        let sums = probs.sum_dim(1).into_data().convert::<f32>().value;
        assert!(sums.iter().all(|s| (s - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_memory_words_are_always_trained() {
        let device = Default::default();
        let model: Model<TestAutodiffBackend> = Model::init(&config(), None, &device);

        let grads = model.forward(batch(&device)).loss.backward();

        assert!(model.memory_words.weight().grad(&grads).is_some());
        assert!(model.word_embed.weight().grad(&grads).is_none());
    }

    #[test]
    fn test_adversarial_loss_is_finite_and_trains_the_classifier() {
        let device = Default::default();
        let model: Model<TestAutodiffBackend> =
            Model::init(&config().with_adversarial(true), None, &device);

        let item = batch(&device);
        let output = model.forward_adversarial(item);

        assert_eq!(output.output.dims(), [2, 3]);
        assert!(output.loss.clone().into_scalar().is_finite());

        let grads = output.loss.backward();

        assert!(model.output.linear.weight.grad(&grads).is_some());
        assert!(model.memory_pos1.weight.grad(&grads).is_some());
    }
}
