use burn::{
    config::Config as _,
    data::dataloader::DataLoaderBuilder,
    module::{AutodiffModule, Module},
    optim::AdamConfig,
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
    train::{
        metric::{AccuracyMetric, CudaMetric, LearningRateMetric, LossMetric},
        ClassificationOutput, LearnerBuilder, TrainStep, ValidStep,
    },
};

use crate::{
    datasets::{relations, Embeddings, Vocabulary},
    pipelines::config::Training,
    utils::renderer::Simple,
};

use super::{batcher::Train, Batcher, Model, ModelConfig};

/// Check that a pretrained table lines up with the vocabulary
pub fn check_embeddings(
    embeddings: Option<&Embeddings>,
    vocab: &Vocabulary,
) -> anyhow::Result<()> {
    if let Some(table) = embeddings {
        if table.vocab_size != vocab.len() {
            return Err(anyhow!(
                "Embedding table has {} rows but the vocabulary has {} words",
                table.vocab_size,
                vocab.len()
            ));
        }
    }

    Ok(())
}

/// Define train function
#[allow(clippy::too_many_arguments)]
pub async fn train<B, M>(
    devices: Vec<B::Device>,              // Devices on which to perform computation
    dataset_train: relations::Dataset,    // Training dataset
    dataset_test: relations::Dataset,     // Testing dataset
    vocab: Vocabulary,                    // Vocabulary shared by training and inference
    embeddings: Option<Embeddings>,       // Pretrained word embeddings
    model_config: M::Config,              // Model hyperparameters
    config: Training,                     // Experiment configuration
    use_tui: bool,                        // Render progress with the terminal UI
) -> anyhow::Result<()>
where
    B: AutodiffBackend,
    M: Model<B> + AutodiffModule<B> + TrainStep<Train<B>, ClassificationOutput<B>> + 'static,
    M::InnerModule: ValidStep<
        Train<<B as AutodiffBackend>::InnerBackend>,
        ClassificationOutput<<B as AutodiffBackend>::InnerBackend>,
    >,
{
    let device = devices
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("At least one device is required"))?;

    if model_config.num_classes() == 0 {
        return Err(anyhow!("Classes are not defined in the model configuration"));
    }

    check_embeddings(embeddings.as_ref(), &vocab)?;

    let artifact_dir = config.artifact_dir();
    tokio::fs::create_dir_all(&artifact_dir).await?;

    B::seed(config.seed);

    let model = M::init(&model_config, embeddings.as_ref(), &device);

    info!(
        "Training {} on {} with {} parameters",
        config.model_name,
        config.corpus,
        model.num_params()
    );

    // Initialize batchers for training and testing data
    let batcher_train = Batcher::<B>::new(vocab.clone(), model_config.max_len(), device.clone());
    let batcher_test =
        Batcher::<B::InnerBackend>::new(vocab, model_config.max_len(), device.clone());

    // Initialize data loaders for training and testing data
    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(dataset_train);

    let dataloader_test = DataLoaderBuilder::new(batcher_test)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .build(dataset_test);

    // Initialize optimizer
    let optimizer = AdamConfig::new().init();

    // Initialize learner
    let mut builder = LearnerBuilder::new(&artifact_dir)
        .metric_train(CudaMetric::new())
        .metric_valid(CudaMetric::new())
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .metric_train_numeric(LearningRateMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(devices)
        .num_epochs(config.num_epochs)
        .summary();

    if !use_tui {
        builder = builder.renderer(Simple::new());
    }

    let learner = builder.build(model, optimizer, config.learning_rate);

    // Train the model
    let model_trained = learner.fit(dataloader_train, dataloader_test);

    save::<B, M, M::Config>(&artifact_dir, &config, &model_config, model_trained)
}

/// Save the experiment configuration, the model configuration and the trained weights
pub fn save<B: Backend, M: Module<B>, C: ModelConfig>(
    artifact_dir: &str,
    config: &Training,
    model_config: &C,
    model: M,
) -> anyhow::Result<()> {
    config
        .save(format!("{artifact_dir}/training.json"))
        .map_err(|e| anyhow!("Unable to save training config: {}", e))?;

    model_config
        .save(format!("{artifact_dir}/config.json"))
        .map_err(|e| anyhow!("Unable to save model config: {}", e))?;

    CompactRecorder::new()
        .record(model.into_record(), format!("{artifact_dir}/model").into())
        .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    info!("Saved trained model to {}", artifact_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_embeddings_rejects_mismatched_table() {
        let vocab = Vocabulary::new(vec!["<pad>".to_string(), "a".to_string()]).unwrap();
        let table = Embeddings::new(vec![0.0; 6], 3, 2).unwrap();

        assert!(check_embeddings(Some(&table), &vocab).is_err());
        assert!(check_embeddings(None, &vocab).is_ok());
    }
}
