use burn::{
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Dropout, Embedding},
    tensor::{activation::softmax, backend::Backend, Int, Tensor},
    train::ClassificationOutput,
};

use crate::{
    models::layers::{gradient, ConvPool, Dense, WordEmbedding},
    pipelines::{
        multi_task::{Text, Train},
        relation_classification::batcher::{self, Infer},
    },
};

/// Task label the discriminator should give relation examples
pub const RELATION_TASK: usize = 1;

/// Task label the discriminator should give text documents
pub const TEXT_TASK: usize = 0;

/// Relation classification and text classification with a shared word encoder. A task
/// discriminator behind gradient reversal keeps the shared feature task-agnostic.
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// Word vectors of both tasks
    pub word_embed: WordEmbedding<B>,

    /// Position vectors relative to the first entity
    pub pos1_embed: Embedding<B>,

    /// Position vectors relative to the second entity
    pub pos2_embed: Embedding<B>,

    /// Dropout
    pub dropout: Dropout,

    /// Word encoder shared by both tasks
    pub shared: ConvPool<B>,

    /// Private encoder of relation sentences and positions
    pub relation_conv: ConvPool<B>,

    /// Relation classifier
    pub relation_output: Dense<B>,

    /// Private encoder of documents
    pub text_conv: ConvPool<B>,

    /// Document classifier
    pub text_output: Dense<B>,

    /// Task discriminator over the shared feature
    pub discriminator: Dense<B>,

    /// Weight of the L2 penalties
    pub l2_coef: f64,

    /// Weight of the discriminator loss
    pub adversarial_weight: f64,
}

/// Output of one task branch
#[derive(Debug)]
pub struct Branch<B: Backend> {
    /// Class logits
    pub logits: Tensor<B, 2>,

    /// L2 penalty of the classifier
    pub l2: Tensor<B, 1>,

    /// The shared feature
    pub shared: Tensor<B, 2>,
}

fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Encode relation examples
    pub fn relation_branch(&self, input: Infer<B>) -> Branch<B> {
        let lexical = self.word_embed.forward_flat(input.lexical);
        let sentence = self.dropout.forward(self.word_embed.forward(input.tokens));

        let encoded = self.relation_conv.forward(Tensor::cat(
            vec![
                sentence.clone(),
                self.pos1_embed.forward(input.positions1),
                self.pos2_embed.forward(input.positions2),
            ],
            2,
        ));
        let shared = self.shared.forward(sentence);

        let feature = self
            .dropout
            .forward(Tensor::cat(vec![lexical, encoded, shared.clone()], 1));
        let (logits, l2) = self.relation_output.forward(feature);

        Branch { logits, l2, shared }
    }

    /// Encode documents
    pub fn text_branch(&self, tokens: Tensor<B, 2, Int>) -> Branch<B> {
        let sentence = self.dropout.forward(self.word_embed.forward(tokens));

        let encoded = self.text_conv.forward(sentence.clone());
        let shared = self.shared.forward(sentence);

        let feature = self
            .dropout
            .forward(Tensor::cat(vec![encoded, shared.clone()], 1));
        let (logits, l2) = self.text_output.forward(feature);

        Branch { logits, l2, shared }
    }

    /// Discriminator loss and its L2 penalty for a batch whose shared features all come from
    /// `task`
    pub fn discriminate(&self, shared: Tensor<B, 2>, task: usize) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let [batch_size, _] = shared.dims();
        let device = shared.device();

        let feature = self.dropout.forward(gradient::reverse(shared, 1.0));
        let (logits, l2) = self.discriminator.forward(feature);

        let labels = Tensor::<B, 1, Int>::zeros([batch_size], &device).add_scalar(task as i64);

        (cross_entropy(logits, labels), l2)
    }

    fn branch_loss(&self, branch: Branch<B>, targets: Tensor<B, 1, Int>, task: usize) -> Tensor<B, 1> {
        let (adversarial, adversarial_l2) = self.discriminate(branch.shared, task);

        cross_entropy(branch.logits, targets)
            + adversarial.mul_scalar(self.adversarial_weight)
            + (branch.l2 + adversarial_l2).mul_scalar(self.l2_coef)
    }

    /// Defines forward pass for the relation task
    pub fn forward_relations(&self, item: batcher::Train<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let branch = self.relation_branch(item.input);
        let output = branch.logits.clone();

        ClassificationOutput {
            loss: self.branch_loss(branch, targets.clone(), RELATION_TASK),
            output,
            targets,
        }
    }

    /// Defines forward pass for the text task
    pub fn forward_text(&self, item: Text<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let branch = self.text_branch(item.tokens);
        let output = branch.logits.clone();

        ClassificationOutput {
            loss: self.branch_loss(branch, targets.clone(), TEXT_TASK),
            output,
            targets,
        }
    }

    /// Defines forward pass for joint training: the summed losses of both tasks, reported with
    /// the relation predictions
    pub fn forward(&self, item: Train<B>) -> ClassificationOutput<B> {
        let relation = self.forward_relations(item.relation);
        let text = self.forward_text(item.text);

        ClassificationOutput {
            loss: relation.loss + text.loss,
            output: relation.output,
            targets: relation.targets,
        }
    }

    /// Defines forward pass for relation inference
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 2> {
        softmax(self.relation_branch(input).logits, 1)
    }
}
