use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

use tokenizers::{
    models::wordlevel::WordLevel,
    pre_tokenizers::split::{Split, SplitPattern},
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, SplitDelimiterBehavior,
    Tokenizer,
};

use crate::utils::files::{read_file, write_file};

/// The padding word, always stored with id 0
pub static PAD_WORD: &str = "<pad>";

/// Vocabulary Error
#[derive(thiserror::Error, Debug)]
pub enum VocabularyError {
    /// The underlying tokenizer rejected the vocabulary or the input
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The vocabulary is missing the padding word
    #[error("vocabulary does not contain the padding word")]
    MissingPad,

    /// Unable to read or write the vocabulary file
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Word/punctuation pattern; a run of leading digits is split off the letters that follow it
static WORDPUNCT: &str = r"\d+|\w+|[^\w\s]+";

/// Split raw text into alphanumeric words, dropping punctuation
pub fn wordpunct(line: &str) -> Result<Vec<String>, VocabularyError> {
    let cleaned: String = line
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    let splitter = Split::new(
        SplitPattern::Regex(WORDPUNCT.to_string()),
        SplitDelimiterBehavior::Removed,
        true,
    )
    .map_err(|e| VocabularyError::Tokenizer(e.to_string()))?;

    let mut pretokenized = PreTokenizedString::from(cleaned.as_str());
    splitter
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| VocabularyError::Tokenizer(e.to_string()))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

/// Collect the words of every sentence into a vocabulary: the padding word first, then the
/// remaining words in sorted order
pub fn build<'a, I>(sentences: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let words: BTreeSet<&str> = sentences
        .into_iter()
        .flat_map(|sentence| sentence.iter().map(String::as_str))
        .filter(|w| *w != PAD_WORD)
        .collect();

    std::iter::once(PAD_WORD)
        .chain(words)
        .map(str::to_string)
        .collect()
}

/// A word-level vocabulary that maps each token to exactly one id
#[derive(Clone)]
pub struct Vocabulary {
    /// Word-level tokenizer holding the word to id mapping
    tokenizer: Tokenizer,

    /// The words in id order
    words: Vec<String>,
}

impl Vocabulary {
    /// Create a vocabulary from words in id order. The padding word doubles as the unknown word.
    pub fn new(words: Vec<String>) -> Result<Self, VocabularyError> {
        if words.first().map(String::as_str) != Some(PAD_WORD) {
            return Err(VocabularyError::MissingPad);
        }

        let vocab: HashMap<String, u32> = words
            .iter()
            .enumerate()
            .map(|(id, w)| (w.clone(), id as u32))
            .collect();

        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token(PAD_WORD.to_string())
            .build()
            .map_err(|e| VocabularyError::Tokenizer(e.to_string()))?;

        Ok(Self {
            tokenizer: Tokenizer::new(model),
            words,
        })
    }

    /// Load a vocabulary file with one word per line
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, VocabularyError> {
        let words = read_file(path)
            .await?
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        Self::new(words)
    }

    /// Write the vocabulary, one word per line
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), VocabularyError> {
        write_file(path, &self.words).await?;

        Ok(())
    }

    /// Map pre-split tokens to ids. Unknown tokens map to the padding id so positions are kept.
    pub fn encode(&self, tokens: &[String]) -> Vec<usize> {
        tokens
            .iter()
            .map(|token| {
                self.tokenizer
                    .token_to_id(token)
                    .map_or(self.pad_id(), |id| id as usize)
            })
            .collect()
    }

    /// The id of the padding word
    pub fn pad_id(&self) -> usize {
        0
    }

    /// The words in id order
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The number of words, including padding
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the vocabulary only holds the padding word
    pub fn is_empty(&self) -> bool {
        self.words.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sentence(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_wordpunct_drops_punctuation() {
        let words = wordpunct("The company's CEO, born 1962 -- resigned!").unwrap();

        assert_eq!(
            words,
            vec!["The", "company", "s", "CEO", "born", "1962", "resigned"]
        );
    }

    #[test]
    fn test_wordpunct_splits_leading_digits() {
        assert_eq!(
            wordpunct("123abc abc123 7th").unwrap(),
            vec!["123", "abc", "abc123", "7", "th"]
        );
        assert_eq!(wordpunct("  ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_build_puts_pad_first() {
        let a = sentence(&["the", "cat", "sat"]);
        let b = sentence(&["a", "cat", "<pad>"]);

        let words = build([a.as_slice(), b.as_slice()]);

        assert_eq!(words, vec!["<pad>", "a", "cat", "sat", "the"]);
    }

    #[test]
    fn test_encode_keeps_alignment_for_unknown_words() {
        let vocab = Vocabulary::new(sentence(&["<pad>", "a", "cat", "sat", "the"])).unwrap();

        let ids = vocab.encode(&sentence(&["the", "dog", "sat", "."]));

        assert_eq!(ids, vec![4, 0, 3, 0]);
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn test_vocabulary_requires_pad() {
        assert!(matches!(
            Vocabulary::new(sentence(&["a", "<pad>"])),
            Err(VocabularyError::MissingPad)
        ));
    }
}
