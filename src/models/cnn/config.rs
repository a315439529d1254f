use burn::{
    nn::DropoutConfig,
    tensor::backend::Backend,
};

use crate::{
    datasets::{features::POSITION_BUCKETS, Embeddings},
    models::layers::{
        ConvBlockConfig, DenseConfig, EntityAttentionConfig, PositionEmbeddingConfig,
        WordEmbeddingConfig,
    },
};

use super::model::Model;

/// The Model Configuration
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Rows of the word embedding table
    pub vocab_size: usize,

    /// Size of each word vector
    pub word_dim: usize,

    /// Number of relation classes
    pub num_classes: usize,

    /// Sentences are padded or truncated to this length
    #[config(default = 97)]
    pub max_len: usize,

    /// Number of relative position buckets
    #[config(default = "POSITION_BUCKETS")]
    pub pos_num: usize,

    /// Size of each position vector
    #[config(default = 5)]
    pub pos_dim: usize,

    /// Convolution width
    #[config(default = 3)]
    pub kernel_size: usize,

    /// Convolution filters, also the size of the attended states
    #[config(default = 310)]
    pub num_filters: usize,

    /// Attention heads; must divide `num_filters`
    #[config(default = 10)]
    pub num_heads: usize,

    /// Entity attention hops
    #[config(default = 1)]
    pub num_hops: usize,

    /// Weight of the L2 penalty on the output layer
    #[config(default = 0.01)]
    pub l2_coef: f64,

    /// Dropout probability
    #[config(default = 0.5)]
    pub dropout: f64,

    /// Update the word embeddings during training
    #[config(default = false)]
    pub tune_word_embed: bool,
}

impl Config {
    /// Initializes the model, with pretrained word vectors when given
    pub fn init<B: Backend>(&self, embeddings: Option<&Embeddings>, device: &B::Device) -> Model<B> {
        let positions = PositionEmbeddingConfig::new()
            .with_num_positions(self.pos_num)
            .with_dim(self.pos_dim);

        let attention = EntityAttentionConfig::new(self.num_filters)
            .with_n_heads(self.num_heads)
            .with_num_hops(self.num_hops);

        Model {
            word_embed: WordEmbeddingConfig::new(self.vocab_size, self.word_dim)
                .with_trainable(self.tune_word_embed)
                .init(embeddings, device),
            pos1_embed: positions.init(device),
            pos2_embed: positions.init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            conv: ConvBlockConfig::new(self.word_dim + 2 * self.pos_dim)
                .with_filters(self.num_filters)
                .with_kernel_size(self.kernel_size)
                .init(device),
            output: DenseConfig::new(attention.output_size(), self.num_classes)
                .with_regularize_bias(false)
                .init(device),
            attention: attention.init(device),
            l2_coef: self.l2_coef,
        }
    }
}
