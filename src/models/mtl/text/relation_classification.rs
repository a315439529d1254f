//! Adapt the joint model to the Relation Classification pipeline for inference

use burn::tensor::{backend::Backend, Tensor};

use crate::{
    datasets::Embeddings,
    pipelines::relation_classification::{self, batcher},
};

use super::{Config, Model};

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
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use crate::{
        datasets::{relations::Item, Vocabulary},
        pipelines::relation_classification::{Batcher, Model as _},
    };

    use super::*;

    #[test]
    fn test_classify_relations_only() {
        let device = Default::default();
        let vocab = Vocabulary::new(
            ["<pad>", "a", "cat", "sat", "the"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
        .unwrap();
        let config = Config::new(5, 4, 3)
            .with_max_len(6)
            .with_num_filters(2)
            .with_pos_dim(2);
        let model: Model<NdArray> = Model::init(&config, None, &device);

        let input: batcher::Infer<NdArray> = Batcher::new(vocab, 6, device)
            .batch(vec!["1 0 0 2 2 the cat sat".parse::<Item>().unwrap()]);
        let probs = model.classify(input);

        assert_eq!(probs.dims(), [1, 3]);
        let sum: f32 = probs.into_data().convert::<f32>().value.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }
}
