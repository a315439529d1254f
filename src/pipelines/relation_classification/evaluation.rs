//! Accuracy and macro-averaged F1 from a confusion matrix.
//!
//! The macro-F1 averages the per-class scores over every class except an optional negative class
//! ("Other" for SemEval), following the SemEval-2010 Task 8 scorer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::datasets::relations::Relations;

/// Counts of `(target, predicted)` pairs
#[derive(Clone, Debug, PartialEq)]
pub struct ConfusionMatrix {
    /// `counts[target][predicted]`
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// An empty matrix for `num_classes` classes
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![vec![0; num_classes]; num_classes],
        }
    }

    /// Count every pair, growing the matrix if a class id is out of range
    pub fn from_pairs(num_classes: usize, targets: &[usize], predictions: &[usize]) -> Self {
        let mut matrix = Self::new(num_classes);

        for (&target, &predicted) in targets.iter().zip(predictions) {
            matrix.add(target, predicted);
        }

        matrix
    }

    /// Count a single pair
    pub fn add(&mut self, target: usize, predicted: usize) {
        let needed = target.max(predicted) + 1;
        if needed > self.counts.len() {
            for row in &mut self.counts {
                row.resize(needed, 0);
            }
            self.counts.resize(needed, vec![0; needed]);
        }

        self.counts[target][predicted] += 1;
    }

    /// The number of classes
    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    /// The number of counted pairs
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Pairs where the prediction matched the target
    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|c| self.counts[c][c]).sum()
    }

    /// Fraction of correct predictions, 0 when empty
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Pairs whose target is `class`
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// Precision of `class`
    pub fn precision(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.predicted(class))
    }

    /// Recall of `class`
    pub fn recall(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.support(class))
    }

    /// Harmonic mean of precision and recall of `class`
    pub fn f1(&self, class: usize) -> f64 {
        let (p, r) = (self.precision(class), self.recall(class));

        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Mean F1 over every class other than `exclude`
    pub fn macro_f1(&self, exclude: Option<usize>) -> f64 {
        let classes: Vec<usize> = (0..self.num_classes())
            .filter(|c| Some(*c) != exclude)
            .collect();

        if classes.is_empty() {
            return 0.0;
        }

        classes.iter().map(|&c| self.f1(c)).sum::<f64>() / classes.len() as f64
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Scores of a single relation class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    /// The relation name
    pub label: String,

    /// Precision
    pub precision: f64,

    /// Recall
    pub recall: f64,

    /// F1
    pub f1: f64,

    /// Number of test examples of this class
    pub support: usize,
}

/// Evaluation report written next to the trained model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Number of evaluated examples
    pub examples: usize,

    /// Fraction of correct predictions
    pub accuracy: f64,

    /// Macro-averaged F1, without the excluded class
    pub macro_f1: f64,

    /// The class left out of the macro-F1, if any
    pub excluded: Option<String>,

    /// Per-class scores
    pub classes: Vec<ClassReport>,
}

impl Report {
    /// Score predictions against targets, leaving `exclude` out of the macro-F1
    pub fn new(
        targets: &[usize],
        predictions: &[usize],
        relations: &Relations,
        exclude: Option<&str>,
    ) -> Self {
        let matrix = ConfusionMatrix::from_pairs(relations.labels.len(), targets, predictions);

        let excluded = exclude.and_then(|name| relations.labels.iter().position(|l| l == name));

        let classes = (0..matrix.num_classes())
            .map(|c| ClassReport {
                label: relations
                    .name(c)
                    .map(str::to_string)
                    .unwrap_or_else(|| c.to_string()),
                precision: matrix.precision(c),
                recall: matrix.recall(c),
                f1: matrix.f1(c),
                support: matrix.support(c),
            })
            .collect();

        Self {
            examples: matrix.total(),
            accuracy: matrix.accuracy(),
            macro_f1: matrix.macro_f1(excluded),
            excluded: excluded.and_then(|c| relations.name(c)).map(str::to_string),
            classes,
        }
    }

    /// Write the report as pretty-printed JSON
    pub async fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        tokio::fs::write(path, json).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn relations() -> Relations {
        Relations {
            labels: vec!["Other".to_string(), "A".to_string(), "B".to_string()],
        }
    }

    #[test]
    fn test_accuracy_and_per_class_scores() {
        let matrix = ConfusionMatrix::from_pairs(3, &[0, 1, 1, 2, 2], &[0, 1, 2, 2, 1]);

        assert_eq!(matrix.total(), 5);
        assert_eq!(matrix.accuracy(), 0.6);
        assert_eq!(matrix.precision(1), 0.5);
        assert_eq!(matrix.recall(1), 0.5);
        assert_eq!(matrix.f1(0), 1.0);
        assert_eq!(matrix.macro_f1(None), (1.0 + 0.5 + 0.5) / 3.0);
        assert_eq!(matrix.macro_f1(Some(0)), 0.5);
    }

    #[test]
    fn test_matrix_grows_for_unseen_classes() {
        let mut matrix = ConfusionMatrix::new(1);
        matrix.add(0, 3);

        assert_eq!(matrix.num_classes(), 4);
        assert_eq!(matrix.accuracy(), 0.0);
        assert_eq!(matrix.f1(3), 0.0);
    }

    #[test]
    fn test_report_excludes_negative_class() {
        let report = Report::new(&[0, 1, 2], &[0, 1, 0], &relations(), Some("Other"));

        assert_eq!(report.examples, 3);
        assert_eq!(report.excluded.as_deref(), Some("Other"));
        assert_eq!(report.macro_f1, 0.5);
        assert_eq!(report.classes[2].support, 1);
        assert_eq!(report.classes[2].f1, 0.0);
    }

    #[test]
    fn test_empty_report_is_zero() {
        let report = Report::new(&[], &[], &relations(), None);

        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.macro_f1, 0.0);
    }
}
