use burn::{
    data::dataloader,
    tensor::{backend::Backend, Bool, Int, Tensor},
};
use derive_new::new;

use crate::{
    datasets::{
        features::{self, Masks, LEXICAL_WIDTH},
        relations, Vocabulary,
    },
    utils::tensors::{ids, mask, pad_to},
};

/// Struct for an inference batch of relation examples
#[derive(Clone, Debug, new)]
pub struct Infer<B: Backend> {
    /// Token ids, `[batch, max_len]`
    pub tokens: Tensor<B, 2, Int>,

    /// Position buckets relative to the first entity, `[batch, max_len]`
    pub positions1: Tensor<B, 2, Int>,

    /// Position buckets relative to the second entity, `[batch, max_len]`
    pub positions2: Tensor<B, 2, Int>,

    /// Lexical window ids around both entities, `[batch, 6]`
    pub lexical: Tensor<B, 2, Int>,

    /// Sentence lengths after truncation, `[batch]`
    pub lengths: Tensor<B, 1, Int>,

    /// Tokens of the first entity, `[batch, max_len]`
    pub entity1: Tensor<B, 2, Bool>,

    /// Tokens of the second entity, `[batch, max_len]`
    pub entity2: Tensor<B, 2, Bool>,

    /// Tokens outside both entities, `[batch, max_len]`
    pub context: Tensor<B, 2, Bool>,
}

/// Struct for a training batch of relation examples
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Relation class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching relation examples
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// Vocabulary for converting tokens to ids
    vocab: Vocabulary,

    /// Sentences are padded or truncated to this length
    max_len: usize,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

/// The per-example features before they are stacked into tensors
struct Encoded {
    tokens: Vec<usize>,
    positions1: Vec<usize>,
    positions2: Vec<usize>,
    lexical: [usize; LEXICAL_WIDTH],
    length: usize,
    masks: Masks,
}

impl<B: Backend> Batcher<B> {
    fn encode(&self, item: &relations::Item) -> Encoded {
        let pad_id = self.vocab.pad_id();

        let tokens = self.vocab.encode(&item.tokens);
        let len = tokens.len();

        Encoded {
            lexical: features::lexical(&tokens, item.entity1.first, item.entity2.first, pad_id),
            positions1: features::positions(len, item.entity1.first),
            positions2: features::positions(len, item.entity2.first),
            length: len.min(self.max_len),
            masks: Masks::new(len, item.entity1, item.entity2, self.max_len),
            tokens,
        }
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<relations::Item, Infer<B>> for Batcher<B> {
    /// Batches a vector of relation examples into an inference batch
    fn batch(&self, items: Vec<relations::Item>) -> Infer<B> {
        let batch_size = items.len();
        let pad_id = self.vocab.pad_id();

        let mut tokens = Vec::with_capacity(batch_size);
        let mut positions1 = Vec::with_capacity(batch_size);
        let mut positions2 = Vec::with_capacity(batch_size);
        let mut lexical = Vec::with_capacity(batch_size);
        let mut lengths = Vec::with_capacity(batch_size);
        let mut entity1 = Vec::with_capacity(batch_size);
        let mut entity2 = Vec::with_capacity(batch_size);
        let mut context = Vec::with_capacity(batch_size);

        for item in &items {
            let encoded = self.encode(item);

            tokens.push(encoded.tokens);
            positions1.push(encoded.positions1);
            positions2.push(encoded.positions2);
            lexical.push(encoded.lexical.to_vec());
            lengths.push(encoded.length);
            entity1.push(encoded.masks.entity1);
            entity2.push(encoded.masks.entity2);
            context.push(encoded.masks.context);
        }

        Infer {
            tokens: pad_to(pad_id, tokens, self.max_len, &self.device),
            positions1: pad_to(0, positions1, self.max_len, &self.device),
            positions2: pad_to(0, positions2, self.max_len, &self.device),
            lexical: pad_to(pad_id, lexical, LEXICAL_WIDTH, &self.device),
            lengths: ids(&lengths, &self.device),
            entity1: mask(entity1, self.max_len, &self.device),
            entity2: mask(entity2, self.max_len, &self.device),
            context: mask(context, self.max_len, &self.device),
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<relations::Item, Train<B>> for Batcher<B> {
    /// Batches a vector of relation examples into a training batch
    fn batch(&self, items: Vec<relations::Item>) -> Train<B> {
        let labels: Vec<usize> = items.iter().map(|item| item.label).collect();

        let input: Infer<B> = self.batch(items);

        Train {
            input,
            targets: ids(&labels, &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use crate::datasets::relations::Item;

    use super::*;

    type TestBackend = NdArray;

    fn vocab() -> Vocabulary {
        Vocabulary::new(
            ["<pad>", "a", "cat", "house", "in", "sat", "the"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_batch_shapes_and_values() {
        let device = Default::default();
        let batcher = Batcher::<TestBackend>::new(vocab(), 6, device);

        let items: Vec<Item> = vec![
            "3 1 1 5 5 the cat sat in the house".parse().unwrap(),
            "0 0 0 1 1 a cat".parse().unwrap(),
        ];

        let batch: Train<TestBackend> = batcher.batch(items);

        assert_eq!(batch.input.tokens.dims(), [2, 6]);
        assert_eq!(batch.input.lexical.dims(), [2, 6]);
        assert_eq!(
            batch.input.tokens.into_data().convert::<i64>().value,
            vec![6, 2, 5, 4, 6, 3, 1, 2, 0, 0, 0, 0]
        );
        assert_eq!(
            batch.input.lexical.into_data().convert::<i64>().value,
            vec![2, 6, 5, 3, 6, 3, 1, 1, 2, 2, 1, 2]
        );
        assert_eq!(
            batch.input.lengths.into_data().convert::<i64>().value,
            vec![6, 2]
        );
        assert_eq!(
            batch.targets.into_data().convert::<i64>().value,
            vec![3, 0]
        );
        assert_eq!(
            batch.input.positions1.into_data().convert::<i64>().value,
            vec![60, 61, 62, 63, 64, 65, 61, 62, 0, 0, 0, 0]
        );
        assert_eq!(
            batch.input.context.into_data().value,
            vec![true, false, true, true, true, false, false, false, false, false, false, false]
        );
    }
}
