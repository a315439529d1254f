use std::path::Path;

use async_trait::async_trait;
use burn::data::dataset::{self, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{
    vocab::{wordpunct, VocabularyError},
    DatasetError, LoadableDataset,
};

/// The name of the auxiliary text classification corpus
pub static DATASET: &str = "imdb";

/// The number of classes in the auxiliary corpus (negative, positive)
pub const NUM_CLASSES: usize = 2;

/// A raw text document with a class id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct Item {
    /// The document text
    pub text: String,

    /// The class id of the document
    pub label: usize,
}

impl Item {
    /// Lowercase and split the text into words
    pub fn document(&self) -> Result<Document, VocabularyError> {
        Ok(Document::new(wordpunct(&self.text.to_lowercase())?, self.label))
    }
}

/// A document split into lowercased words
#[derive(Clone, Debug, PartialEq, new)]
pub struct Document {
    /// The words of the document
    pub words: Vec<String>,

    /// The class id of the document
    pub label: usize,
}

/// Struct for the auxiliary text classification dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

impl Dataset {
    /// Wrap already-parsed items
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            dataset: InMemDataset::new(items),
        }
    }
}

/// Implement the Dataset trait for the text dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[async_trait]
impl LoadableDataset<Item> for Dataset {
    /// Constructs the dataset for a mode (either "train" or "test") from `<dir>/<mode>.csv`
    async fn load(dir: &Path, mode: &str) -> Result<Self, DatasetError> {
        let path = dir.join(format!("{mode}.csv"));
        let reader = csv::ReaderBuilder::new();

        let dataset: InMemDataset<Item> = InMemDataset::from_csv(&path, &reader)?;

        info!(
            "Loaded {} {} documents from {}",
            dataset::Dataset::len(&dataset),
            mode,
            path.display()
        );

        Ok(Self { dataset })
    }
}

#[cfg(test)]
mod tests {
    use burn::data::dataset::Dataset as _;
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_load_csv_documents() -> Result<(), DatasetError> {
        let dir = std::env::temp_dir().join(format!("relex-imdb-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(
            dir.join("train.csv"),
            "text,label\n\"a wonderful, moving film\",1\nterrible pacing,0\n",
        )
        .await?;

        let dataset = Dataset::load(&dir, "train").await?;

        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.get(0),
            Some(Item::new("a wonderful, moving film".to_string(), 1))
        );

        tokio::fs::remove_dir_all(dir).await?;

        Ok(())
    }

    #[test]
    fn test_document_is_lowercased_and_split() {
        let document = Item::new("The film, a GREAT film!".to_string(), 1)
            .document()
            .unwrap();

        assert_eq!(document.words, vec!["the", "film", "a", "great", "film"]);
        assert_eq!(document.label, 1);
    }
}
