use std::{collections::HashMap, path::Path};

use burn::tensor::{backend::Backend, Data, Shape, Tensor};
use candle_core::{DType, Device};

/// Standard deviation of the random vectors given to words missing from the pretrained table
const MISSING_WORD_STD: f32 = 0.1;

/// Embedding Error
#[derive(thiserror::Error, Debug)]
pub enum EmbeddingError {
    /// Unable to read or write the `.npy` file
    #[error(transparent)]
    Npy(#[from] candle_core::Error),

    /// The word list does not line up with the embedding rows
    #[error("expected {expected} embedding rows, found {found}")]
    RowMismatch {
        /// Rows implied by the word list
        expected: usize,

        /// Rows in the matrix
        found: usize,
    },
}

/// A dense `[vocab_size, dim]` word embedding table kept on the host
#[derive(Clone, Debug, PartialEq)]
pub struct Embeddings {
    /// Row-major values
    pub values: Vec<f32>,

    /// Number of rows
    pub vocab_size: usize,

    /// Number of columns
    pub dim: usize,
}

impl Embeddings {
    /// Wrap row-major values
    pub fn new(values: Vec<f32>, vocab_size: usize, dim: usize) -> Result<Self, EmbeddingError> {
        if values.len() != vocab_size * dim {
            return Err(EmbeddingError::RowMismatch {
                expected: vocab_size,
                found: values.len() / dim.max(1),
            });
        }

        Ok(Self {
            values,
            vocab_size,
            dim,
        })
    }

    /// Read a 2-dimensional `.npy` matrix
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let tensor = candle_core::Tensor::read_npy(path)?;
        let (vocab_size, dim) = tensor.dims2()?;

        let values = tensor
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;

        Self::new(values, vocab_size, dim)
    }

    /// Write the matrix as a 2-dimensional f32 `.npy` file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EmbeddingError> {
        candle_core::Tensor::from_vec(
            self.values.clone(),
            (self.vocab_size, self.dim),
            &Device::Cpu,
        )?
        .write_npy(path)?;

        Ok(())
    }

    /// Keep only the rows for `vocab`. Words missing from the pretrained table are drawn from
    /// `N(0, 0.1)` and the padding row is zeroed.
    pub fn trim(
        &self,
        pretrained_words: &[String],
        vocab: &[String],
        pad_id: usize,
    ) -> Result<Self, EmbeddingError> {
        if pretrained_words.len() != self.vocab_size {
            return Err(EmbeddingError::RowMismatch {
                expected: pretrained_words.len(),
                found: self.vocab_size,
            });
        }

        let word2id: HashMap<&str, usize> = pretrained_words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_str(), i))
            .collect();

        let random = candle_core::Tensor::randn(
            0f32,
            MISSING_WORD_STD,
            (vocab.len(), self.dim),
            &Device::Cpu,
        )?
        .flatten_all()?
        .to_vec1::<f32>()?;

        let mut values = Vec::with_capacity(vocab.len() * self.dim);
        let mut found = 0;

        for (i, word) in vocab.iter().enumerate() {
            if i == pad_id {
                values.extend(std::iter::repeat(0.0).take(self.dim));
            } else if let Some(&id) = word2id.get(word.as_str()) {
                values.extend_from_slice(self.row(id));
                found += 1;
            } else {
                values.extend_from_slice(&random[i * self.dim..(i + 1) * self.dim]);
            }
        }

        info!(
            "Trimmed embeddings: {}/{} words found in the pretrained table",
            found,
            vocab.len()
        );

        Self::new(values, vocab.len(), self.dim)
    }

    /// A single row of the table
    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    /// Copy the table to a device tensor
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let data = Data::new(self.values.clone(), Shape::new([self.vocab_size, self.dim]));

        Tensor::from_data(data.convert::<B::FloatElem>(), device)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_trim_copies_known_rows_and_zeroes_padding() {
        let pretrained = Embeddings::new(vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0], 3, 2).unwrap();

        let trimmed = pretrained
            .trim(
                &words(&["cat", "dog", "<pad>"]),
                &words(&["<pad>", "dog", "zebra"]),
                0,
            )
            .unwrap();

        assert_eq!(trimmed.vocab_size, 3);
        assert_eq!(trimmed.row(0), &[0.0, 0.0]);
        assert_eq!(trimmed.row(1), &[2.0, 2.0]);
        assert!(trimmed.row(2).iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn test_trim_rejects_mismatched_word_list() {
        let pretrained = Embeddings::new(vec![1.0, 1.0], 1, 2).unwrap();

        assert!(matches!(
            pretrained.trim(&words(&["a", "b"]), &words(&["<pad>"]), 0),
            Err(EmbeddingError::RowMismatch { .. })
        ));
    }

    #[test]
    fn test_npy_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("relex-embed-{}.npy", std::process::id()));
        let table = Embeddings::new(vec![0.5, -0.5, 1.5, 2.5], 2, 2).unwrap();

        table.save(&path).unwrap();
        let loaded = Embeddings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, table);
    }
}
