//! Adapt the per-relation experts to the Relation Classification pipeline

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
        let output = self.forward(item);
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
        Config::new(vocab_size, word_dim, num_classes)
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
        models::mtl::relations::model::difference_loss,
        pipelines::relation_classification::{Batcher, Model as _},
    };

    use super::*;

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
            .with_num_filters(5)
            .with_pos_dim(2)
    }

    #[test]
    fn test_difference_loss_is_zero_for_orthogonal_features() {
        let device = Default::default();
        let shared = Tensor::<NdArray, 2>::from_floats([[1.0, 0.0], [1.0, 1.0]], &device);
        let orthogonal = Tensor::from_floats([[0.0, 2.0], [1.0, -1.0]], &device);
        let aligned = Tensor::from_floats([[1.0, 0.0], [1.0, 1.0]], &device);

        let zero = difference_loss(&[orthogonal.clone()], shared.clone()).into_scalar();
        let loss = difference_loss(&[orthogonal, aligned], shared).into_scalar();

        assert_eq!(zero, 0.0);
        assert_eq!(loss, 1.0 + 4.0);
    }

    #[test]
    fn test_scores_are_probability_differences() {
        let device = Default::default();
        let model: Model<NdArray> = Model::init(&config(), None, &device);

        let scores = model.classify(batch::<NdArray>(&device).input);

        assert_eq!(scores.dims(), [2, 3]);
        let values = scores.into_data().convert::<f32>().value;
        assert!(values.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_train_step_reaches_every_expert_and_the_shared_encoder() {
        let device = Default::default();
        let model: Model<Autodiff<NdArray>> = Model::init(&config(), None, &device);

        let output = model.forward(batch(&device));
        assert!(output.loss.clone().into_scalar().is_finite());

        let grads = output.loss.backward();

        assert!(model
            .experts
            .iter()
            .all(|expert| expert.linear.weight.grad(&grads).is_some()));
        assert!(model.adversary.linear.weight.grad(&grads).is_some());
        assert!(model.word_embed.weight().grad(&grads).is_some());
    }
}
