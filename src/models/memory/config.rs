use burn::{nn::DropoutConfig, tensor::backend::Backend};

use crate::{
    datasets::{features::POSITION_BUCKETS, Embeddings},
    models::layers::{
        adversarial::PerturbationConfig, ConvPoolConfig, DenseConfig, PositionEmbeddingConfig,
        WordAttentionConfig, WordEmbeddingConfig,
    },
};

use super::model::Model;

/// The Model Configuration
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Rows of the word embedding tables
    pub vocab_size: usize,

    /// Size of each word vector
    pub word_dim: usize,

    /// Number of relation classes
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

    /// Convolution widths
    #[config(default = "vec![3, 4, 5]")]
    pub filter_sizes: Vec<usize>,

    /// Filters per width
    #[config(default = 100)]
    pub num_filters: usize,

    /// Word attention hops
    #[config(default = 1)]
    pub num_hops: usize,

    /// Weight of the L2 penalty on the output layer
    #[config(default = 0.01)]
    pub l2_coef: f64,

    /// Dropout probability
    #[config(default = 0.5)]
    pub dropout: f64,

    /// Update the main word embeddings during training
    #[config(default = false)]
    pub tune_word_embed: bool,

    /// Add the adversarial and virtual adversarial losses during training
    #[config(default = false)]
    pub adversarial: bool,

    /// Perturbation settings for adversarial training
    #[config(default = "PerturbationConfig::new()")]
    pub perturbation: PerturbationConfig,
}

impl Config {
    /// Size of a memory slot: a word vector and two position vectors
    pub fn memory_dim(&self) -> usize {
        self.word_dim + 2 * self.pos_dim
    }

    /// Initializes the model. The memory word table starts from the same pretrained vectors but is
    /// always trained.
    pub fn init<B: Backend>(&self, embeddings: Option<&Embeddings>, device: &B::Device) -> Model<B> {
        let positions = PositionEmbeddingConfig::new()
            .with_num_positions(self.pos_num)
            .with_dim(self.pos_dim);
        let words = WordEmbeddingConfig::new(self.vocab_size, self.word_dim);

        let attention = WordAttentionConfig::new(self.memory_dim()).with_num_hops(self.num_hops);
        let conv = ConvPoolConfig::new(self.memory_dim())
            .with_widths(self.filter_sizes.clone())
            .with_filters(self.num_filters);

        Model {
            word_embed: words
                .clone()
                .with_trainable(self.tune_word_embed)
                .init(embeddings, device),
            pos1_embed: positions.init(device),
            pos2_embed: positions.init(device),
            memory_words: words.with_trainable(true).init(embeddings, device),
            memory_pos1: positions.init(device),
            memory_pos2: positions.init(device),
            attention: attention.init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output: DenseConfig::new(
                attention.output_size() + conv.output_size(),
                self.num_classes,
            )
            .init(device),
            conv: conv.init(device),
            l2_coef: self.l2_coef,
            adversarial: self.adversarial,
            norm_length: self.perturbation.norm_length,
            power_iterations: self.perturbation.power_iterations,
            virtual_weight: self.perturbation.virtual_weight,
        }
    }
}
