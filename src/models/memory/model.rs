use burn::{
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Dropout, Embedding},
    tensor::{
        activation::softmax,
        backend::{AutodiffBackend, Backend},
        Int, Tensor,
    },
    train::ClassificationOutput,
};

use crate::{
    models::layers::{
        adversarial::{self, PerturbationConfig},
        ConvPool, Dense, WordAttention, WordEmbedding,
    },
    pipelines::relation_classification::batcher::{Infer, Train},
    utils::tensors::masked_mean,
};

/// Memory-network CNN: word attention over a separate memory of the context produces the
/// lexical feature, and a multi-width CNN encodes the sentence
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// Word vectors of the sentence encoder
    pub word_embed: WordEmbedding<B>,

    /// Position vectors relative to the first entity
    pub pos1_embed: Embedding<B>,

    /// Position vectors relative to the second entity
    pub pos2_embed: Embedding<B>,

    /// Word vectors of the memory
    pub memory_words: WordEmbedding<B>,

    /// Memory position vectors relative to the first entity
    pub memory_pos1: Embedding<B>,

    /// Memory position vectors relative to the second entity
    pub memory_pos2: Embedding<B>,

    /// Entity pair attention over the context memory
    pub attention: WordAttention<B>,

    /// Dropout on the words and on the final feature
    pub dropout: Dropout,

    /// Sentence encoder
    pub conv: ConvPool<B>,

    /// Relation classifier
    pub output: Dense<B>,

    /// Weight of the output layer's L2 penalty
    pub l2_coef: f64,

    /// Whether training adds the adversarial losses
    pub adversarial: bool,

    /// L2 norm of the perturbations
    pub norm_length: f64,

    /// Power iterations for the virtual adversarial direction
    pub power_iterations: usize,

    /// Weight of the virtual adversarial loss
    pub virtual_weight: f64,
}

/// The embedded inputs that adversarial training perturbs, plus the position vectors
#[derive(Clone, Debug)]
pub struct Embedded<B: Backend> {
    /// Word attention output, `[batch, 2 * memory_dim]`
    pub lexical: Tensor<B, 2>,

    /// Sentence word vectors, `[batch, max_len, word_dim]`
    pub sentence: Tensor<B, 3>,

    /// `[batch, max_len, pos_dim]`
    pub pos1: Tensor<B, 3>,

    /// `[batch, max_len, pos_dim]`
    pub pos2: Tensor<B, 3>,

    /// `[batch]`
    pub lengths: Tensor<B, 1, Int>,
}

impl<B: Backend> Embedded<B> {
    fn detach(self) -> Self {
        Self {
            lexical: self.lexical.detach(),
            sentence: self.sentence.detach(),
            pos1: self.pos1.detach(),
            pos2: self.pos2.detach(),
            lengths: self.lengths,
        }
    }
}

fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Look up the sentence and attend over the memory
    pub fn embed(&self, input: Infer<B>) -> Embedded<B> {
        let memory = Tensor::cat(
            vec![
                self.memory_words.forward(input.tokens.clone()),
                self.memory_pos1.forward(input.positions1.clone()),
                self.memory_pos2.forward(input.positions2.clone()),
            ],
            2,
        );

        let entities = Tensor::cat(
            vec![
                masked_mean(memory.clone(), input.entity1),
                masked_mean(memory.clone(), input.entity2),
            ],
            1,
        );

        Embedded {
            lexical: self.attention.forward(entities, memory, input.context),
            sentence: self.word_embed.forward(input.tokens),
            pos1: self.pos1_embed.forward(input.positions1),
            pos2: self.pos2_embed.forward(input.positions2),
            lengths: input.lengths,
        }
    }

    /// Logits and the L2 penalty for (possibly perturbed) embedded inputs
    pub fn head(
        &self,
        lexical: Tensor<B, 2>,
        sentence: Tensor<B, 3>,
        pos1: Tensor<B, 3>,
        pos2: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Tensor<B, 1>) {
        let sentence = self.dropout.forward(sentence);
        let pooled = self.conv.forward(Tensor::cat(vec![sentence, pos1, pos2], 2));

        let feature = self.dropout.forward(Tensor::cat(vec![lexical, pooled], 1));

        self.output.forward(feature)
    }

    /// Relation logits, `[batch, num_classes]`
    pub fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        let embedded = self.embed(input);

        let (logits, _) = self.head(
            embedded.lexical,
            embedded.sentence,
            embedded.pos1,
            embedded.pos2,
        );

        logits
    }

    /// Defines forward pass for training without the adversarial losses
    pub fn forward(&self, item: Train<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let embedded = self.embed(item.input);

        let (output, l2) = self.head(
            embedded.lexical,
            embedded.sentence,
            embedded.pos1,
            embedded.pos2,
        );

        let loss = cross_entropy(output.clone(), targets.clone()) + l2.mul_scalar(self.l2_coef);

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

    /// Perturbation settings of this model
    pub fn perturbation(&self) -> PerturbationConfig {
        PerturbationConfig::new()
            .with_norm_length(self.norm_length)
            .with_power_iterations(self.power_iterations)
            .with_virtual_weight(self.virtual_weight)
    }
}

impl<B: AutodiffBackend> Model<B> {
    /// Defines forward pass for adversarial training: the clean loss, the loss on inputs
    /// perturbed along the loss gradient, and the weighted KL divergence to inputs perturbed in
    /// the virtual adversarial direction
    pub fn forward_adversarial(&self, item: Train<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let perturbation = self.perturbation();

        // The perturbations need their own backward passes, so they are found first on detached
        // inputs and only their values enter the training graph
        let fixed = self.embed(item.input.clone()).detach();

        let (adv_lexical, adv_sentence) = adversarial::adversarial_perturbations(
            fixed.lexical.clone(),
            fixed.sentence.clone(),
            perturbation.norm_length,
            |lexical, sentence| {
                let (logits, _) =
                    self.head(lexical, sentence, fixed.pos1.clone(), fixed.pos2.clone());

                cross_entropy(logits, targets.clone())
            },
        );

        let (clean_logits, _) = self.head(
            fixed.lexical.clone(),
            fixed.sentence.clone(),
            fixed.pos1.clone(),
            fixed.pos2.clone(),
        );

        let (vadv_lexical, vadv_sentence) = adversarial::virtual_adversarial_perturbations(
            clean_logits.detach(),
            fixed.lexical.clone(),
            fixed.sentence.clone(),
            fixed.lengths.clone(),
            &perturbation,
            |lexical, sentence| {
                self.head(lexical, sentence, fixed.pos1.clone(), fixed.pos2.clone())
                    .0
            },
        );

        let embedded = self.embed(item.input);

        let (output, l2) = self.head(
            embedded.lexical.clone(),
            embedded.sentence.clone(),
            embedded.pos1.clone(),
            embedded.pos2.clone(),
        );
        let loss = cross_entropy(output.clone(), targets.clone()) + l2.mul_scalar(self.l2_coef);

        let (adv_logits, _) = self.head(
            embedded.lexical.clone() + adv_lexical,
            embedded.sentence.clone() + adv_sentence,
            embedded.pos1.clone(),
            embedded.pos2.clone(),
        );
        let adv_loss = cross_entropy(adv_logits, targets.clone());

        let (vadv_logits, _) = self.head(
            embedded.lexical + vadv_lexical,
            embedded.sentence + vadv_sentence,
            embedded.pos1,
            embedded.pos2,
        );
        let vadv_loss = adversarial::kl_divergence_with_logits(output.clone().detach(), vadv_logits);

        let loss = loss + adv_loss + vadv_loss.mul_scalar(perturbation.virtual_weight);

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }
}
