use burn::{
    data::dataloader::DataLoaderBuilder,
    module::Module,
    optim::AdamConfig,
    record::CompactRecorder,
    tensor::backend::AutodiffBackend,
    train::{
        metric::{AccuracyMetric, CudaMetric, LearningRateMetric, LossMetric},
        LearnerBuilder,
    },
};

use crate::{
    datasets::{Embeddings, Vocabulary},
    models::mtl::text,
    pipelines::{
        config::Training,
        relation_classification::{self, training::check_embeddings, ModelConfig as _},
    },
    utils::renderer::Simple,
};

use super::{Batcher, Paired};

/// Train relation classification jointly with the text task. Metrics are reported on the
/// relation half of each batch.
#[allow(clippy::too_many_arguments)]
pub async fn train<B: AutodiffBackend>(
    devices: Vec<B::Device>,          // Devices on which to perform computation
    dataset_train: Paired,            // Training dataset
    dataset_test: Paired,             // Testing dataset
    vocab: Vocabulary,                // Vocabulary shared by both tasks
    embeddings: Option<Embeddings>,   // Pretrained word embeddings
    model_config: text::Config,       // Model hyperparameters
    config: Training,                 // Experiment configuration
    use_tui: bool,                    // Render progress with the terminal UI
) -> anyhow::Result<()> {
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

    let model: text::Model<B> = model_config.init(embeddings.as_ref(), &device);

    info!(
        "Training {} on {} and {} with {} parameters",
        config.model_name,
        config.corpus,
        crate::datasets::text::DATASET,
        model.num_params()
    );

    // Initialize batchers for training and testing data
    let batcher_train = Batcher::<B>::new(
        relation_classification::Batcher::new(vocab.clone(), model_config.max_len, device.clone()),
        vocab.clone(),
        model_config.text_max_len,
        device.clone(),
    );
    let batcher_test = Batcher::<B::InnerBackend>::new(
        relation_classification::Batcher::new(vocab.clone(), model_config.max_len, device.clone()),
        vocab,
        model_config.text_max_len,
        device.clone(),
    );

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

    relation_classification::training::save::<B, text::Model<B>, text::Config>(
        &artifact_dir,
        &config,
        &model_config,
        model_trained,
    )
}
