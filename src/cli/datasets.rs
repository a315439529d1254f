pub use crate::datasets::{relations::Corpus as Dataset, DatasetError};

/// Every dataset the binaries accept, in the order they are listed in help output
pub static DATASETS: &[Dataset; 2] = &[Dataset::SemEval, Dataset::Nyt];

/// The names of every dataset, joined for help output
pub fn names() -> String {
    DATASETS
        .iter()
        .map(Dataset::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_dataset_names() {
        assert_eq!(names(), "semeval, nyt");
        assert_eq!(Dataset::try_from("NYT").unwrap(), Dataset::Nyt);
    }
}
