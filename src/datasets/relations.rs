use std::{
    collections::HashMap,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use async_trait::async_trait;
use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::utils::{classes, files::read_file};

use super::{DatasetError, LoadableDataset};

/// The relation-extraction corpora with a cleaned, pre-tokenized layout
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Corpus {
    /// SemEval-2010 Task 8
    SemEval,

    /// NYT-2010 distant supervision
    Nyt,
}

impl Corpus {
    /// The unique string token that identifies this corpus
    pub fn as_str(&self) -> &'static str {
        match self {
            Corpus::SemEval => "semeval",
            Corpus::Nyt => "nyt",
        }
    }

    /// The directory under the data dir that holds the corpus files
    pub fn dir_name(&self) -> &'static str {
        match self {
            Corpus::SemEval => "SemEval",
            Corpus::Nyt => "nyt2010",
        }
    }

    /// The number of relation classes
    pub fn num_classes(&self) -> usize {
        match self {
            Corpus::SemEval => 19,
            Corpus::Nyt => 53,
        }
    }

    /// The label that marks "no relation", excluded from the macro-F1 score
    pub fn negative_label(&self) -> &'static str {
        match self {
            Corpus::SemEval => "Other",
            Corpus::Nyt => "NA",
        }
    }

    /// The location of the corpus files under the given data dir
    pub fn dir(&self, data_dir: &str) -> PathBuf {
        Path::new(data_dir).join(self.dir_name())
    }
}

impl TryFrom<&str> for Corpus {
    type Error = DatasetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "semeval" => Ok(Corpus::SemEval),
            "nyt" => Ok(Corpus::Nyt),
            _ => Err(DatasetError::Unknown(value.to_string())),
        }
    }
}

impl Display for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An inclusive token span
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct Span {
    /// Index of the first token
    pub first: usize,

    /// Index of the last token
    pub last: usize,
}

impl Span {
    /// Whether the token index falls inside the span
    pub fn contains(&self, index: usize) -> bool {
        self.first <= index && index <= self.last
    }
}

/// A labeled sentence with two marked entities
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct Item {
    /// The relation class id
    pub label: usize,

    /// The first entity
    pub entity1: Span,

    /// The second entity
    pub entity2: Span,

    /// The sentence tokens
    pub tokens: Vec<String>,
}

/// Reasons a corpus line can be rejected
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ItemError {
    /// Fewer fields than the label, four entity offsets and one token
    #[error("expected at least 6 fields, found {0}")]
    TooShort(usize),

    /// A numeric field could not be parsed
    #[error("invalid integer field '{0}'")]
    InvalidInteger(String),

    /// An entity span is reversed or reaches past the sentence
    #[error("entity span {first}..={last} is invalid for a sentence of {len} tokens")]
    InvalidSpan {
        /// First token of the span
        first: usize,

        /// Last token of the span
        last: usize,

        /// Sentence length
        len: usize,
    },
}

impl FromStr for Item {
    type Err = ItemError;

    /// Parse a `label e1_first e1_last e2_first e2_last tokens...` line
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(ItemError::TooShort(fields.len()));
        }

        let mut numbers = [0usize; 5];
        for (slot, field) in numbers.iter_mut().zip(&fields[..5]) {
            *slot = field
                .parse()
                .map_err(|_| ItemError::InvalidInteger(field.to_string()))?;
        }

        let [label, e1_first, e1_last, e2_first, e2_last] = numbers;
        let tokens: Vec<String> = fields[5..].iter().map(|t| t.to_string()).collect();

        let entity1 = checked_span(e1_first, e1_last, tokens.len())?;
        let entity2 = checked_span(e2_first, e2_last, tokens.len())?;

        Ok(Item::new(label, entity1, entity2, tokens))
    }
}

fn checked_span(first: usize, last: usize, len: usize) -> Result<Span, ItemError> {
    if first > last || last >= len {
        return Err(ItemError::InvalidSpan { first, last, len });
    }

    Ok(Span::new(first, last))
}

/// Struct for a relation corpus split
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

    /// Parse the lines of a cleaned corpus file, skipping blank lines
    pub fn parse(path: &str, lines: &[String]) -> Result<Self, DatasetError> {
        let mut items = Vec::with_capacity(lines.len());

        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let item = line.parse().map_err(|source| DatasetError::Malformed {
                path: path.to_string(),
                line: i + 1,
                source,
            })?;

            items.push(item);
        }

        Ok(Self::from_items(items))
    }

    /// Iterate over every item in the split
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        dataset::Dataset::iter(&self.dataset)
    }
}

/// Implement the Dataset trait for the relation corpus
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
    /// Constructs the dataset for a mode (either "train" or "test") from `<dir>/<mode>.cln`
    async fn load(dir: &Path, mode: &str) -> Result<Self, DatasetError> {
        let path = dir.join(format!("{mode}.cln"));
        let lines = read_file(&path).await?;

        let dataset = Self::parse(&path.display().to_string(), &lines)?;

        info!("Loaded {} {} examples from {}", dataset.dataset.len(), mode, path.display());

        Ok(dataset)
    }
}

/// The relation labels of a corpus, indexed by class id
#[derive(Clone, Debug, PartialEq)]
pub struct Relations {
    /// Relation names in class id order
    pub labels: Vec<String>,
}

impl Relations {
    /// Parse `id name` lines. Lines with a single field are assigned the next id in file order.
    pub fn parse(lines: &[String]) -> Self {
        let mut indexed: Vec<(usize, String)> = Vec::with_capacity(lines.len());

        for (i, line) in lines.iter().filter(|l| !l.trim().is_empty()).enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();

            match fields.as_slice() {
                [id, name, ..] => {
                    let id = id.parse().unwrap_or(i);
                    indexed.push((id, name.to_string()));
                }
                [name] => indexed.push((i, name.to_string())),
                [] => {}
            }
        }

        indexed.sort_by_key(|(id, _)| *id);

        Self {
            labels: indexed.into_iter().map(|(_, name)| name).collect(),
        }
    }

    /// Load `relations.txt` from the corpus dir
    pub async fn load(dir: &Path) -> Result<Self, DatasetError> {
        let path = dir.join("relations.txt");
        let relations = Self::parse(&read_file(&path).await?);

        if relations.labels.is_empty() {
            return Err(DatasetError::NoClasses(path.display().to_string()));
        }

        Ok(relations)
    }

    /// A map from class ids to relation names
    pub fn id2label(&self) -> HashMap<usize, String> {
        classes::id2label(&self.labels)
    }

    /// A map from relation names to class ids
    pub fn label2id(&self) -> HashMap<String, usize> {
        classes::invert_map(self.id2label())
    }

    /// The relation name for a class id
    pub fn name(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }
}
