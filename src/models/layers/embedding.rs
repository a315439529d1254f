use burn::{
    config::Config,
    module::{Module, Param},
    nn::{Embedding, EmbeddingConfig, Initializer},
    tensor::{backend::Backend, Int, Tensor},
};

use crate::datasets::Embeddings;

/// Configuration for a [WordEmbedding]
#[derive(Config, Debug)]
pub struct WordEmbeddingConfig {
    /// Number of rows
    pub vocab_size: usize,

    /// Size of each vector
    pub dim: usize,

    /// Whether the table is updated during training
    #[config(default = false)]
    pub trainable: bool,
}

/// A lookup table, optionally initialized from pretrained vectors and optionally frozen
#[derive(Module, Debug)]
pub struct WordEmbedding<B: Backend> {
    embedding: Embedding<B>,
    trainable: bool,
}

impl WordEmbeddingConfig {
    /// Build a configuration that matches a pretrained table
    pub fn from_pretrained(table: &Embeddings) -> Self {
        Self::new(table.vocab_size, table.dim)
    }

    /// Initialize from `pretrained` when given, otherwise from `N(0, 1)`
    pub fn init<B: Backend>(
        &self,
        pretrained: Option<&Embeddings>,
        device: &B::Device,
    ) -> WordEmbedding<B> {
        let embedding = match pretrained {
            Some(table) => Embedding {
                weight: Param::from_tensor(table.to_tensor(device)),
            },
            None => EmbeddingConfig::new(self.vocab_size, self.dim).init(device),
        };

        WordEmbedding {
            embedding,
            trainable: self.trainable,
        }
    }
}

impl<B: Backend> WordEmbedding<B> {
    /// `[batch, seq_length]` ids to `[batch, seq_length, dim]` vectors
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let embedded = self.embedding.forward(ids);

        if self.trainable {
            embedded
        } else {
            embedded.detach()
        }
    }

    /// `[batch, n]` ids to their vectors laid end to end, `[batch, n * dim]`
    pub fn forward_flat(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, n] = ids.dims();
        let [_, dim] = self.embedding.weight.shape().dims;

        self.forward(ids).reshape([batch_size, n * dim])
    }

    /// The `[vocab_size, dim]` table
    pub fn weight(&self) -> &Param<Tensor<B, 2>> {
        &self.embedding.weight
    }
}

/// Configuration for a trainable position embedding table
#[derive(Config, Debug)]
pub struct PositionEmbeddingConfig {
    /// Number of position buckets
    #[config(default = 123)]
    pub num_positions: usize,

    /// Size of each vector
    #[config(default = 5)]
    pub dim: usize,
}

impl PositionEmbeddingConfig {
    /// Initialize a Glorot-uniform table
    pub fn init<B: Backend>(&self, device: &B::Device) -> Embedding<B> {
        EmbeddingConfig::new(self.num_positions, self.dim)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_pretrained_rows_are_looked_up() {
        let device = Default::default();
        let table = Embeddings::new(vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0], 3, 2).unwrap();
        let embedding = WordEmbeddingConfig::from_pretrained(&table).init::<TestBackend>(Some(&table), &device);

        let ids = Tensor::<TestBackend, 2, Int>::from_ints([[2, 0, 1]], &device);
        let flat = embedding.forward_flat(ids);

        assert_eq!(flat.dims(), [1, 6]);
        assert_eq!(
            flat.into_data().convert::<f32>().value,
            vec![3.0, 4.0, 0.0, 0.0, 1.0, 2.0]
        );
    }

    #[test]
    fn test_frozen_table_gets_no_gradient() {
        let device = Default::default();
        let embedding = WordEmbeddingConfig::new(4, 3).init::<Autodiff<NdArray>>(None, &device);

        let ids = Tensor::from_ints([[1, 2]], &device);
        let grads = embedding.forward(ids).sum().backward();

        assert!(embedding.embedding.weight.grad(&grads).is_none());
    }
}
