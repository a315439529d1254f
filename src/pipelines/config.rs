use burn::LearningRate;

use crate::datasets::Corpus;

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Training {
    /// Batch size
    #[config(default = 100)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 50)]
    pub num_epochs: usize,

    /// Adam learning rate
    #[config(default = 1e-3)]
    pub learning_rate: LearningRate,

    /// Data loader worker threads
    #[config(default = 4)]
    pub num_workers: usize,

    /// Seed for parameter initialization and shuffling
    #[config(default = 42)]
    pub seed: u64,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// Model name (e.g., "cnn")
    pub model_name: String,

    /// The relation corpus to train on
    pub corpus: Corpus,

    /// Relation labels in class id order
    pub labels: Vec<String>,
}

impl Training {
    /// Directory holding the checkpoints, the configs and the trained weights
    pub fn artifact_dir(&self) -> String {
        artifact_dir(&self.data_dir, self.corpus, &self.model_name)
    }
}

/// `<data_dir>/<corpus dir>/<model name>`
pub fn artifact_dir(data_dir: &str, corpus: Corpus, model_name: &str) -> String {
    format!("{}/{}/{}", data_dir, corpus.dir_name(), model_name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_artifact_dir_nests_model_under_corpus() {
        let config = Training::new("cnn".to_string(), Corpus::SemEval, vec![])
            .with_data_dir("/tmp/relex".to_string());

        assert_eq!(config.artifact_dir(), "/tmp/relex/SemEval/cnn");
        assert_eq!(config.batch_size, 100);
    }
}
