use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::{
    datasets::{relations, text::Document, Vocabulary},
    pipelines::relation_classification,
    utils::tensors::{ids, pad_to},
};

/// A relation example paired with a text document
pub type Item = (relations::Item, Document);

/// Struct for a batch of text documents
#[derive(Clone, Debug, new)]
pub struct Text<B: Backend> {
    /// Token ids, `[batch, text_max_len]`
    pub tokens: Tensor<B, 2, Int>,

    /// Document class ids, `[batch]`
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for a joint training batch
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Relation examples
    pub relation: relation_classification::batcher::Train<B>,

    /// Text documents
    pub text: Text<B>,
}

/// Struct for batching paired examples
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// Batcher for the relation half
    relations: relation_classification::Batcher<B>,

    /// Vocabulary for converting document words to ids
    vocab: Vocabulary,

    /// Documents are padded or truncated to this length
    text_max_len: usize,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Encode and pad every document
    pub fn text(&self, documents: Vec<Document>) -> Text<B> {
        let labels: Vec<usize> = documents.iter().map(|d| d.label).collect();

        let tokens = documents
            .iter()
            .map(|d| self.vocab.encode(&d.words))
            .collect();

        Text {
            tokens: pad_to(self.vocab.pad_id(), tokens, self.text_max_len, &self.device),
            targets: ids(&labels, &self.device),
        }
    }
}

/// Implement Batcher trait for Batcher struct for joint training
impl<B: Backend> dataloader::batcher::Batcher<Item, Train<B>> for Batcher<B> {
    /// Splits the pairs and batches each half
    fn batch(&self, items: Vec<Item>) -> Train<B> {
        let (relation_items, text_items): (Vec<_>, Vec<_>) = items.into_iter().unzip();

        Train {
            relation: self.relations.batch(relation_items),
            text: self.text(text_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::datasets::text;

    type TestBackend = NdArray;

    #[test]
    fn test_pairs_are_split_into_both_batches() {
        let device = Default::default();
        let vocab = Vocabulary::new(
            ["<pad>", "a", "cat", "film", "great", "sat", "the"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
        .unwrap();

        let batcher = Batcher::<TestBackend>::new(
            relation_classification::Batcher::new(vocab.clone(), 4, device),
            vocab,
            5,
            device,
        );

        let batch: Train<TestBackend> = batcher.batch(vec![
            (
                "1 0 0 1 1 a cat".parse().unwrap(),
                text::Item::new("The film, a GREAT film!".to_string(), 1)
                    .document()
                    .unwrap(),
            ),
            (
                "0 0 0 2 2 the cat sat".parse().unwrap(),
                text::Item::new("boring".to_string(), 0)
                    .document()
                    .unwrap(),
            ),
        ]);

        assert_eq!(batch.relation.input.tokens.dims(), [2, 4]);
        assert_eq!(
            batch.relation.targets.into_data().convert::<i64>().value,
            vec![1, 0]
        );

        assert_eq!(
            batch.text.tokens.into_data().convert::<i64>().value,
            vec![6, 3, 1, 4, 3, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            batch.text.targets.into_data().convert::<i64>().value,
            vec![1, 0]
        );
    }
}
