use std::path::Path;

use async_trait::async_trait;

/// Cleaned relation-extraction corpora (SemEval-2010 Task 8, NYT-2010)
pub mod relations;

/// Auxiliary text classification corpus (IMDB) for multi-task learning
pub mod text;

/// Vocabulary building and lookup
pub mod vocab;

/// Pretrained word embeddings
pub mod embeddings;

/// Per-example feature extraction for relation classification
pub mod features;

pub use embeddings::Embeddings;
pub use relations::Corpus;
pub use vocab::Vocabulary;

/// A dataset which can be loaded from a directory for a mode ("train" or "test")
#[async_trait]
pub trait LoadableDataset<I>: burn::data::dataset::Dataset<I> {
    /// Load the dataset
    async fn load(dir: &Path, mode: &str) -> Result<Self, DatasetError>
    where
        Self: std::marker::Sized;
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),

    /// A line in a dataset file could not be parsed
    #[error("{path}:{line}: {source}")]
    Malformed {
        /// The file being read
        path: String,

        /// The 1-based line number
        line: usize,

        /// The parse failure
        source: relations::ItemError,
    },

    /// A label file did not define any classes
    #[error("no classes defined in {0}")]
    NoClasses(String),

    /// Unable to read a dataset file
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
