//! Command line tool to train a relation classifier

use anyhow::anyhow;
use burn::backend::{libtorch::LibTorchDevice, Autodiff, LibTorch};
use burn_relation_extraction::{
    cli::{
        datasets::{self, Dataset},
        models::Architecture,
    },
    datasets::{relations, text, Embeddings, LoadableDataset, Vocabulary},
    models::{cnn, memory, mtl},
    pipelines::{
        config::Training,
        multi_task::{self, Paired},
        prepare,
        relation_classification::{self, ModelConfig},
    },
};
use pico_args::Arguments;

type B = Autodiff<LibTorch>;

const HELP: &str = "\
Usage: train MODEL DATASET [OPTIONS]

Arguments:
  MODEL                The model to use ('cnn', 'memory', 'memory-adv', 'mtl-relations', 'mtl-text')
  DATASET              The dataset to use (e.g., 'semeval')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -w, --word-dim       Word vector size, used when no trimmed embeddings exist (defaults to 50)
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -l, --learning-rate  Adam learning rate
  -s, --seed           Random seed
  --no-tui             Disable TUI
";

#[derive(Debug)]
struct Args {
    model: String,
    dataset: String,
    data_dir: Option<String>,
    word_dim: Option<usize>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f64>,
    seed: Option<u64>,
    use_tui: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            word_dim: pargs.opt_value_from_str(["-w", "--word-dim"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            learning_rate: pargs.opt_value_from_str(["-l", "--learning-rate"])?,
            seed: pargs.opt_value_from_str(["-s", "--seed"])?,
            use_tui: !(pargs.contains("--no-tui")),
            model: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: MODEL"),
                _ => anyhow!("{}", e),
            })?,
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!(
                    "Missing required argument: DATASET ({})",
                    datasets::names()
                ),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

/// Everything loaded before training starts
struct Inputs {
    train: relations::Dataset,
    test: relations::Dataset,
    vocab: Vocabulary,
    embeddings: Option<Embeddings>,
    word_dim: usize,
    num_classes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let architecture = Architecture::try_from(args.model.as_str())?;
    let dataset = Dataset::try_from(args.dataset.as_str())?;
    let data_dir = args.data_dir.clone().unwrap_or_else(|| "data".to_string());

    let dir = dataset.dir(&data_dir);
    let (train, test, relations) = futures::try_join!(
        relations::Dataset::load(&dir, "train"),
        relations::Dataset::load(&dir, "test"),
        relations::Relations::load(&dir),
    )?;

    let vocab = Vocabulary::load(prepare::vocab_path(&data_dir, dataset))
        .await
        .map_err(|e| anyhow!("Unable to load the vocabulary, run `prepare` first: {}", e))?;

    let word_dim = args.word_dim.unwrap_or(50);
    let embeddings = prepare::load_embeddings(&data_dir, dataset, word_dim)?;

    let mut config = Training::new(
        architecture.to_string(),
        dataset,
        relations.labels.clone(),
    )
    .with_data_dir(data_dir.clone());

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }

    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let inputs = Inputs {
        train,
        test,
        word_dim: embeddings.as_ref().map_or(word_dim, |table| table.dim),
        num_classes: relations.labels.len(),
        vocab,
        embeddings,
    };

    let device = LibTorchDevice::Cuda(0);

    match architecture {
        Architecture::Cnn => {
            train_relations::<cnn::Model<B>>(device, inputs, config, args.use_tui, |c| c).await
        }
        Architecture::Memory => {
            train_relations::<memory::Model<B>>(device, inputs, config, args.use_tui, |c| c).await
        }
        Architecture::MemoryAdv => {
            train_relations::<memory::Model<B>>(device, inputs, config, args.use_tui, |c| {
                c.with_adversarial(true)
            })
            .await
        }
        Architecture::MtlRelations => {
            train_relations::<mtl::relations::Model<B>>(device, inputs, config, args.use_tui, |c| c)
                .await
        }
        Architecture::MtlText => {
            let text_dir = prepare::text_dir(&data_dir);
            let (text_train, text_test) = futures::try_join!(
                text::Dataset::load(&text_dir, "train"),
                text::Dataset::load(&text_dir, "test"),
            )?;

            let model_config = mtl::text::Config::for_vocabulary(
                inputs.vocab.len(),
                inputs.word_dim,
                inputs.num_classes,
            );

            multi_task::train::<B>(
                vec![device],
                Paired::new(inputs.train, text_train)?,
                Paired::new(inputs.test, text_test)?,
                inputs.vocab,
                inputs.embeddings,
                model_config,
                config,
                args.use_tui,
            )
            .await
        }
    }
}

async fn train_relations<M>(
    device: LibTorchDevice,
    inputs: Inputs,
    config: Training,
    use_tui: bool,
    customize: impl FnOnce(M::Config) -> M::Config,
) -> anyhow::Result<()>
where
    M: relation_classification::Model<B>
        + burn::module::AutodiffModule<B>
        + burn::train::TrainStep<
            relation_classification::batcher::Train<B>,
            burn::train::ClassificationOutput<B>,
        > + 'static,
    M::InnerModule: burn::train::ValidStep<
        relation_classification::batcher::Train<LibTorch>,
        burn::train::ClassificationOutput<LibTorch>,
    >,
{
    let model_config = customize(M::Config::for_vocabulary(
        inputs.vocab.len(),
        inputs.word_dim,
        inputs.num_classes,
    ));

    relation_classification::train::<B, M>(
        vec![device],
        inputs.train,
        inputs.test,
        inputs.vocab,
        inputs.embeddings,
        model_config,
        config,
        use_tui,
    )
    .await
}
