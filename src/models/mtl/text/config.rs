use burn::{nn::DropoutConfig, tensor::backend::Backend};

use crate::{
    datasets::{
        features::{LEXICAL_WIDTH, POSITION_BUCKETS},
        text, Embeddings,
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

    /// Number of relation classes
    pub num_classes: usize,

    /// Relation sentences are padded or truncated to this length
    #[config(default = 98)]
    pub max_len: usize,

    /// Documents are padded or truncated to this length
    #[config(default = 300)]
    pub text_max_len: usize,

    /// Number of document classes
    #[config(default = "text::NUM_CLASSES")]
    pub text_classes: usize,

    /// Number of relative position buckets
    #[config(default = "POSITION_BUCKETS")]
    pub pos_num: usize,

    /// Size of each position vector
    #[config(default = 5)]
    pub pos_dim: usize,

    /// Convolution widths of every encoder
    #[config(default = "vec![3, 4, 5]")]
    pub filter_sizes: Vec<usize>,

    /// Filters per width
    #[config(default = 100)]
    pub num_filters: usize,

    /// Weight of the L2 penalties
    #[config(default = 0.01)]
    pub l2_coef: f64,

    /// Weight of the task discriminator loss
    #[config(default = 0.01)]
    pub adversarial_weight: f64,

    /// Dropout probability
    #[config(default = 0.5)]
    pub dropout: f64,

    /// Update the word embeddings during training
    #[config(default = false)]
    pub tune_word_embed: bool,
}

impl Config {
    /// Initializes the model
    pub fn init<B: Backend>(&self, embeddings: Option<&Embeddings>, device: &B::Device) -> Model<B> {
        let positions = PositionEmbeddingConfig::new()
            .with_num_positions(self.pos_num)
            .with_dim(self.pos_dim);

        let words = ConvPoolConfig::new(self.word_dim)
            .with_widths(self.filter_sizes.clone())
            .with_filters(self.num_filters);
        let sentence = ConvPoolConfig::new(self.word_dim + 2 * self.pos_dim)
            .with_widths(self.filter_sizes.clone())
            .with_filters(self.num_filters);

        Model {
            word_embed: WordEmbeddingConfig::new(self.vocab_size, self.word_dim)
                .with_trainable(self.tune_word_embed)
                .init(embeddings, device),
            pos1_embed: positions.init(device),
            pos2_embed: positions.init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            shared: words.init(device),
            relation_conv: sentence.init(device),
            relation_output: DenseConfig::new(
                LEXICAL_WIDTH * self.word_dim + sentence.output_size() + words.output_size(),
                self.num_classes,
            )
            .init(device),
            text_conv: words.init(device),
            text_output: DenseConfig::new(2 * words.output_size(), self.text_classes).init(device),
            discriminator: DenseConfig::new(words.output_size(), 2).init(device),
            l2_coef: self.l2_coef,
            adversarial_weight: self.adversarial_weight,
        }
    }
}
