use burn::{nn::DropoutConfig, tensor::backend::Backend};

use crate::{
    datasets::{
        features::{LEXICAL_WIDTH, POSITION_BUCKETS},
        Embeddings,
    },
    models::layers::{ConvPoolConfig, DenseConfig, PositionEmbeddingConfig, WordEmbeddingConfig},
};

use super::model::Model;

/// The Model Configuration
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Rows of the word embedding table
    pub vocab_size: usize,

    /// Size of each word vector
    pub word_dim: usize,

    /// Number of relations, one expert each
    pub num_classes: usize,

    /// Sentences are padded or truncated to this length
    #[config(default = 98)]
    pub max_len: usize,

    /// Number of relative position buckets
    #[config(default = "POSITION_BUCKETS")]
    pub pos_num: usize,

    /// Size of each position vector
    #[config(default = 5)]
    pub pos_dim: usize,

    /// Convolution width of every encoder
    #[config(default = 3)]
    pub filter_size: usize,

    /// Filters of every encoder
    #[config(default = 310)]
    pub num_filters: usize,

    /// Dropout probability
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl Config {
    /// Initializes the model. The word table is always trained.
    pub fn init<B: Backend>(&self, embeddings: Option<&Embeddings>, device: &B::Device) -> Model<B> {
        let encoder = ConvPoolConfig::new(self.word_dim + 2 * self.pos_dim)
            .with_widths(vec![self.filter_size])
            .with_filters(self.num_filters);
        let shared = encoder.clone().with_reverse_gradient(true);

        let expert = DenseConfig::new(
            2 * encoder.output_size() + LEXICAL_WIDTH * self.word_dim,
            2,
        )
        .with_regularize(false);

        Model {
            word_embed: WordEmbeddingConfig::new(self.vocab_size, self.word_dim)
                .with_trainable(true)
                .init(embeddings, device),
            pos_embed: PositionEmbeddingConfig::new()
                .with_num_positions(self.pos_num)
                .with_dim(self.pos_dim)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            shared: shared.init(device),
            adversary: DenseConfig::new(shared.output_size(), self.num_classes)
                .with_regularize(false)
                .init(device),
            private: (0..self.num_classes).map(|_| encoder.init(device)).collect(),
            experts: (0..self.num_classes).map(|_| expert.init(device)).collect(),
        }
    }
}
