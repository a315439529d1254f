use burn::{
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Dropout, Embedding},
    tensor::{activation::softmax, backend::Backend, Int, Tensor},
    train::ClassificationOutput,
};

use crate::{
    models::layers::{ConvPool, Dense, WordEmbedding},
    pipelines::relation_classification::batcher::{Infer, Train},
};

/// Per-relation experts: every relation gets a private encoder and a yes/no classifier, and all
/// of them read a shared encoder that is trained to hide the relation from an adversary
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// Word vectors, shared by the sentence and the lexical window
    pub word_embed: WordEmbedding<B>,

    /// One position table for both entities
    pub pos_embed: Embedding<B>,

    /// Dropout
    pub dropout: Dropout,

    /// Shared encoder behind gradient reversal
    pub shared: ConvPool<B>,

    /// Relation classifier over the shared feature
    pub adversary: Dense<B>,

    /// One private encoder per relation
    pub private: Vec<ConvPool<B>>,

    /// One binary classifier per relation
    pub experts: Vec<Dense<B>>,
}

/// Everything a forward pass produces
#[derive(Debug)]
pub struct Output<B: Backend> {
    /// `p(yes) - p(no)` of every expert, `[batch, num_relations]`
    pub scores: Tensor<B, 2>,

    /// The binary logits of every expert
    pub expert_logits: Vec<Tensor<B, 2>>,

    /// The adversary's relation logits
    pub adversary_logits: Tensor<B, 2>,

    /// The private features of every expert
    pub private: Vec<Tensor<B, 2>>,

    /// The shared feature
    pub shared: Tensor<B, 2>,
}

/// `sum((private_r . shared)^2)` over relations and examples, pushing the private features
/// towards orthogonality with the shared one
pub fn difference_loss<B: Backend>(private: &[Tensor<B, 2>], shared: Tensor<B, 2>) -> Tensor<B, 1> {
    let device = shared.device();

    private
        .iter()
        .map(|feature| {
            (feature.clone() * shared.clone())
                .sum_dim(1)
                .powf_scalar(2.0)
                .sum()
        })
        .fold(Tensor::zeros([1], &device), |total, loss| total + loss)
}

fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Run the shared encoder, the adversary and every expert
    pub fn run(&self, input: Infer<B>) -> Output<B> {
        let [batch_size, _] = input.tokens.dims();

        let lexical = self.word_embed.forward_flat(input.lexical);
        let features = Tensor::cat(
            vec![
                self.word_embed.forward(input.tokens),
                self.pos_embed.forward(input.positions1),
                self.pos_embed.forward(input.positions2),
            ],
            2,
        );

        let shared = self
            .dropout
            .forward(self.shared.forward(self.dropout.forward(features.clone())));
        let (adversary_logits, _) = self.adversary.forward(shared.clone());

        let mut scores = Vec::with_capacity(self.experts.len());
        let mut expert_logits = Vec::with_capacity(self.experts.len());
        let mut private = Vec::with_capacity(self.experts.len());

        for (encoder, expert) in self.private.iter().zip(&self.experts) {
            let encoded = encoder.forward(self.dropout.forward(features.clone()));

            let feature = self.dropout.forward(Tensor::cat(
                vec![encoded.clone(), shared.clone(), lexical.clone()],
                1,
            ));
            let (logits, _) = expert.forward(feature);

            let probs = softmax(logits.clone(), 1);
            scores.push(
                probs.clone().slice([0..batch_size, 1..2]) - probs.slice([0..batch_size, 0..1]),
            );

            expert_logits.push(logits);
            private.push(encoded);
        }

        Output {
            scores: Tensor::cat(scores, 1),
            expert_logits,
            adversary_logits,
            private,
            shared,
        }
    }

    /// Defines forward pass for training: the summed binary losses of the experts, the
    /// adversary's loss and the difference loss
    pub fn forward(&self, item: Train<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let output = self.run(item.input);

        let task_loss = output
            .expert_logits
            .into_iter()
            .enumerate()
            .map(|(relation, logits)| {
                let labels = targets.clone().equal_elem(relation as i64).int();

                cross_entropy(logits, labels)
            })
            .reduce(|total, loss| total + loss)
            .unwrap_or_else(|| Tensor::zeros([1], &targets.device()));

        let adversary_loss = cross_entropy(output.adversary_logits, targets.clone());
        let difference = difference_loss(&output.private, output.shared);

        ClassificationOutput {
            loss: task_loss + adversary_loss + difference,
            output: output.scores,
            targets,
        }
    }

    /// Defines forward pass for inference: one score per relation
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 2> {
        self.run(input).scores
    }
}
