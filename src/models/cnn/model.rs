use burn::{
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Dropout, Embedding},
    tensor::{activation::softmax, backend::Backend, Tensor},
    train::ClassificationOutput,
};

use crate::{
    models::layers::{ConvBlock, Dense, EntityAttention, WordEmbedding},
    pipelines::relation_classification::batcher::{Infer, Train},
};

/// CNN with entity attention for relation classification
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// Word vectors
    pub word_embed: WordEmbedding<B>,

    /// Position vectors relative to the first entity
    pub pos1_embed: Embedding<B>,

    /// Position vectors relative to the second entity
    pub pos2_embed: Embedding<B>,

    /// Dropout on the word vectors and on the pooled feature
    pub dropout: Dropout,

    /// Same-length convolution over the sentence
    pub conv: ConvBlock<B>,

    /// Context attention over each entity
    pub attention: EntityAttention<B>,

    /// Relation classifier
    pub output: Dense<B>,

    /// Weight of the output layer's L2 penalty
    pub l2_coef: f64,
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Relation logits, `[batch, num_classes]`
    pub fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        let words = self.dropout.forward(self.word_embed.forward(input.tokens));
        let pos1 = self.pos1_embed.forward(input.positions1);
        let pos2 = self.pos2_embed.forward(input.positions2);

        let states = self.conv.forward(Tensor::cat(vec![words, pos1, pos2], 2));

        let pooled = self
            .attention
            .forward(states, input.entity1, input.entity2, input.context);

        let (logits, _) = self.output.forward(self.dropout.forward(pooled));

        logits
    }

    /// Defines forward pass for training
    pub fn forward(&self, item: Train<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let output = self.logits(item.input);

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());
        let loss = loss + self.output.l2().mul_scalar(self.l2_coef);

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// Defines forward pass for inference
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 2> {
        softmax(self.logits(input), 1)
    }
}
