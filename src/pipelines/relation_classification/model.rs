use std::fmt::Display;

use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};

use crate::datasets::Embeddings;

use super::batcher::Infer;

/// A trait for models that can be used for Relation Classification
pub trait Model<B: Backend>: Module<B> + Display + Sized {
    /// The model configuration
    type Config: ModelConfig;

    /// Initialize the model, taking the word embedding table from `embeddings` when given
    fn init(config: &Self::Config, embeddings: Option<&Embeddings>, device: &B::Device) -> Self;

    /// Defines forward pass for inference, returning one score per relation class
    fn classify(&self, input: Infer<B>) -> Tensor<B, 2>;
}

/// A trait for configs that can be used for Relation Classification models
pub trait ModelConfig: burn::config::Config + Clone {
    /// Create a configuration with default hyperparameters for a vocabulary and label set
    fn for_vocabulary(vocab_size: usize, word_dim: usize, num_classes: usize) -> Self;

    /// Sentences are padded or truncated to this length
    fn max_len(&self) -> usize;

    /// The number of relation classes
    fn num_classes(&self) -> usize;
}
