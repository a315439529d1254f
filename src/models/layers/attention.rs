use burn::{
    config::Config,
    module::Module,
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        LayerNorm, LayerNormConfig, Linear, LinearConfig,
    },
    tensor::{
        activation::{relu, softmax},
        backend::Backend,
        Bool, Tensor,
    },
};

use crate::utils::tensors::masked_mean;

use super::dense::{Dense, DenseConfig};

/// Score given to masked positions before the softmax
const MASKED_SCORE: f32 = -1.0e4;

/// Configuration for [EntityAttention]
#[derive(Config, Debug)]
pub struct EntityAttentionConfig {
    /// Size of each token state
    pub d_model: usize,

    /// Attention heads; must divide `d_model`
    #[config(default = 10)]
    pub n_heads: usize,

    /// Attention hops per entity
    #[config(default = 1)]
    pub num_hops: usize,
}

/// Multi-hop attention of the context tokens over each entity. Every hop attends the context to
/// the current keys, adds the residual and normalizes; the result becomes the keys of the next
/// hop. The final context states are mean-pooled for each entity.
#[derive(Module, Debug)]
pub struct EntityAttention<B: Backend> {
    attention1: Vec<MultiHeadAttention<B>>,
    norm1: Vec<LayerNorm<B>>,
    attention2: Vec<MultiHeadAttention<B>>,
    norm2: Vec<LayerNorm<B>>,
}

impl EntityAttentionConfig {
    /// Initialize one attention layer and one layer norm per hop and entity
    pub fn init<B: Backend>(&self, device: &B::Device) -> EntityAttention<B> {
        let attention = || {
            (0..self.num_hops)
                .map(|_| {
                    MultiHeadAttentionConfig::new(self.d_model, self.n_heads)
                        .with_dropout(0.0)
                        .init(device)
                })
                .collect()
        };
        let norm = || {
            (0..self.num_hops)
                .map(|_| LayerNormConfig::new(self.d_model).init(device))
                .collect()
        };

        EntityAttention {
            attention1: attention(),
            norm1: norm(),
            attention2: attention(),
            norm2: norm(),
        }
    }

    /// Size of the pooled output
    pub fn output_size(&self) -> usize {
        2 * self.d_model
    }
}

impl<B: Backend> EntityAttention<B> {
    /// `[batch, seq_length, d_model]` states and `[batch, seq_length]` masks to
    /// `[batch, 2 * d_model]`
    pub fn forward(
        &self,
        states: Tensor<B, 3>,
        entity1: Tensor<B, 2, Bool>,
        entity2: Tensor<B, 2, Bool>,
        context: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let pooled1 = Self::attend(
            &self.attention1,
            &self.norm1,
            states.clone(),
            entity1,
            context.clone(),
        );
        let pooled2 = Self::attend(&self.attention2, &self.norm2, states, entity2, context);

        Tensor::cat(vec![pooled1, pooled2], 1)
    }

    fn attend(
        attention: &[MultiHeadAttention<B>],
        norm: &[LayerNorm<B>],
        states: Tensor<B, 3>,
        entity: Tensor<B, 2, Bool>,
        context: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let mut queries = states.clone();
        let mut keys = states;
        let mut key_mask = entity;

        for (attention, norm) in attention.iter().zip(norm) {
            let input = MhaInput::new(queries.clone(), keys.clone(), keys)
                .mask_pad(key_mask.bool_not());
            let attended = attention.forward(input).context;

            queries = norm.forward(attended + queries);
            keys = queries.clone();
            key_mask = context.clone();
        }

        masked_mean(queries, context)
    }
}

/// Configuration for [WordAttention]
#[derive(Config, Debug)]
pub struct WordAttentionConfig {
    /// Size of each memory slot
    pub d_model: usize,

    /// Attention hops
    #[config(default = 1)]
    pub num_hops: usize,
}

/// Memory-network word attention: the entity pair scores every context slot with
/// `tanh([e; c_i] w + b)`, and each hop replaces the entity vector with
/// `[relu(linear(e)); sum_i alpha_i c_i]`
#[derive(Module, Debug)]
pub struct WordAttention<B: Backend> {
    score: Linear<B>,
    entity: Dense<B>,
    num_hops: usize,
}

impl WordAttentionConfig {
    /// Initialize the scorer and the entity projection
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordAttention<B> {
        WordAttention {
            score: LinearConfig::new(3 * self.d_model, 1).init(device),
            entity: DenseConfig::new(2 * self.d_model, self.d_model)
                .with_regularize(false)
                .init(device),
            num_hops: self.num_hops,
        }
    }

    /// Size of the output
    pub fn output_size(&self) -> usize {
        2 * self.d_model
    }
}

impl<B: Backend> WordAttention<B> {
    /// `[batch, 2 * d_model]` entities over `[batch, seq_length, d_model]` memory, attending only
    /// where `mask` is set; returns `[batch, 2 * d_model]`
    pub fn forward(
        &self,
        entities: Tensor<B, 2>,
        memory: Tensor<B, 3>,
        mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_length, d_model] = memory.dims();
        let weights = mask.clone().int().float();

        let mut entities = entities;

        for _ in 0..self.num_hops {
            let tiled = entities
                .clone()
                .reshape([batch_size, 1, 2 * d_model])
                .repeat(1, seq_length);

            let scores = self
                .score
                .forward(Tensor::cat(vec![tiled, memory.clone()], 2))
                .tanh()
                .reshape([batch_size, seq_length])
                .mask_fill(mask.clone().bool_not(), MASKED_SCORE);

            // Rows without any context end up all zero
            let alpha = softmax(scores, 1) * weights.clone();

            let attended = (alpha.reshape([batch_size, seq_length, 1]) * memory.clone())
                .sum_dim(1)
                .reshape([batch_size, d_model]);

            let (projected, _) = self.entity.forward(entities);

            entities = Tensor::cat(vec![relu(projected), attended], 1);
        }

        entities
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, tensor::Distribution};
    use pretty_assertions::assert_eq;

    use crate::utils::tensors::mask;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_entity_attention_output_shape() {
        let device = Default::default();
        let config = EntityAttentionConfig::new(20).with_num_hops(2);
        let attention = config.init::<TestBackend>(&device);

        let states = Tensor::random([2, 5, 20], Distribution::Normal(0.0, 1.0), &device);
        let entity1 = mask(
            vec![vec![true, false, false, false, false]; 2],
            5,
            &device,
        );
        let entity2 = mask(
            vec![vec![false, false, false, true, false]; 2],
            5,
            &device,
        );
        let context = mask(
            vec![
                vec![false, true, true, false, true],
                vec![false, true, true, false, false],
            ],
            5,
            &device,
        );

        let output = attention.forward(states, entity1, entity2, context);

        assert_eq!(output.dims(), [2, config.output_size()]);
        assert!(output
            .into_data()
            .convert::<f32>()
            .value
            .iter()
            .all(|v| v.is_finite()));
    }

    #[test]
    fn test_word_attention_ignores_masked_memory() {
        let device = Default::default();
        let attention = WordAttentionConfig::new(3).init::<TestBackend>(&device);

        let entities = Tensor::random([1, 6], Distribution::Normal(0.0, 1.0), &device);
        let memory = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 2.0, 3.0], [100.0, 100.0, 100.0]]],
            &device,
        );
        let only_first = mask(vec![vec![true, false]], 2, &device);

        let output = attention.forward(entities, memory, only_first);
        let attended = output.slice([0..1, 3..6]).into_data().convert::<f32>().value;

        assert_eq!(attended, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_word_attention_without_context_is_finite() {
        let device = Default::default();
        let attention = WordAttentionConfig::new(2)
            .with_num_hops(2)
            .init::<TestBackend>(&device);

        let output = attention.forward(
            Tensor::ones([1, 4], &device),
            Tensor::ones([1, 3, 2], &device),
            mask(vec![vec![false, false, false]], 3, &device),
        );

        let values = output.into_data().convert::<f32>().value;
        assert_eq!(values.len(), 4);
        assert_eq!(&values[2..], &[0.0, 0.0]);
    }
}
