use burn::data::dataset::Dataset;

use crate::datasets::{
    relations,
    text::{self, Document},
    vocab::VocabularyError,
};

use super::batcher::Item;

/// Walks both corpora side by side for as long as the larger one, cycling through the smaller
pub struct Paired {
    relations: relations::Dataset,
    documents: Vec<Document>,
}

impl Paired {
    /// Pair two corpora, splitting every text document into words up front
    pub fn new(
        relations: relations::Dataset,
        text: text::Dataset,
    ) -> Result<Self, VocabularyError> {
        let documents = text
            .iter()
            .map(|item| item.document())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            relations,
            documents,
        })
    }

    /// The relation half
    pub fn relations(&self) -> &relations::Dataset {
        &self.relations
    }
}

impl Dataset<Item> for Paired {
    /// Returns relation example `index` and text document `index`, each taken modulo the size of
    /// its corpus
    fn get(&self, index: usize) -> Option<Item> {
        if index >= self.len() {
            return None;
        }

        let relation = self.relations.get(index % self.relations.len())?;
        let document = self.documents.get(index % self.documents.len())?.clone();

        Some((relation, document))
    }

    /// Returns the length of the larger corpus, or 0 when either is empty
    fn len(&self) -> usize {
        let (relations, documents) = (self.relations.len(), self.documents.len());

        if relations == 0 || documents == 0 {
            0
        } else {
            relations.max(documents)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;

    fn relations() -> relations::Dataset {
        relations::Dataset::from_items(
            ["1 0 0 1 1 a cat", "0 0 0 1 1 the cat", "2 0 0 1 1 cat sat"]
                .iter()
                .map(|line| line.parse().unwrap())
                .collect(),
        )
    }

    fn documents(n: usize) -> text::Dataset {
        text::Dataset::from_items(
            (0..n)
                .map(|i| text::Item::new(format!("doc{i}"), i % 2))
                .collect(),
        )
    }

    #[test]
    fn test_text_corpus_is_cycled() {
        let paired = Paired::new(relations(), documents(2)).unwrap();

        assert_eq!(paired.len(), 3);
        assert_eq!(
            paired.get(2).map(|(r, d)| (r.label, d.words)),
            Some((2, vec!["doc0".to_string()]))
        );
        assert!(paired.get(3).is_none());
    }

    #[test]
    fn test_every_document_is_reached_in_an_epoch() {
        let paired = Paired::new(relations(), documents(5)).unwrap();

        assert_eq!(paired.len(), 5);

        let items: Vec<Item> = (0..paired.len()).filter_map(|i| paired.get(i)).collect();

        let words: BTreeSet<String> = items.iter().map(|(_, d)| d.words.join(" ")).collect();
        let labels: BTreeSet<usize> = items.iter().map(|(r, _)| r.label).collect();

        assert_eq!(words.len(), 5);
        assert_eq!(labels, BTreeSet::from([0, 1, 2]));
        assert_eq!(
            paired.get(3).map(|(r, d)| (r.label, d.words)),
            Some((1, vec!["doc3".to_string()]))
        );
        assert!(paired.get(5).is_none());
    }

    #[test]
    fn test_empty_text_corpus_yields_nothing() {
        let paired = Paired::new(relations(), documents(0)).unwrap();

        assert_eq!(paired.len(), 0);
        assert!(paired.get(0).is_none());
    }
}
