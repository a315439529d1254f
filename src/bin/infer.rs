//! Command line tool to classify a test set with a trained model and score the predictions

use anyhow::anyhow;
use burn::backend::{libtorch::LibTorchDevice, LibTorch};
use burn_relation_extraction::{
    cli::{datasets::Dataset, models::Architecture},
    datasets::{relations, LoadableDataset, Vocabulary},
    models::{cnn, memory, mtl},
    pipelines::{
        config::artifact_dir,
        prepare,
        relation_classification::{infer, inference::write_results, Report},
    },
};
use pico_args::Arguments;

type B = LibTorch;

const HELP: &str = "\
Usage: infer MODEL DATASET [OPTIONS]

Arguments:
  MODEL                The trained model to use (e.g., 'cnn')
  DATASET              The dataset to classify (e.g., 'semeval')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -b, --batch-size     Examples per forward pass (defaults to 100)
  -o, --output         Where to write the predictions (defaults to '<model dir>/results.txt')
";

#[derive(Debug)]
struct Args {
    model: String,
    dataset: String,
    data_dir: Option<String>,
    batch_size: Option<usize>,
    output: Option<String>,
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
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            output: pargs.opt_value_from_str(["-o", "--output"])?,
            model: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: MODEL"),
                _ => anyhow!("{}", e),
            })?,
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
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
    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());
    let batch_size = args.batch_size.unwrap_or(100);

    let dir = dataset.dir(&data_dir);
    let (test, relations) = futures::try_join!(
        relations::Dataset::load(&dir, "test"),
        relations::Relations::load(&dir),
    )?;

    let vocab = Vocabulary::load(prepare::vocab_path(&data_dir, dataset)).await?;

    let artifact_dir = artifact_dir(&data_dir, dataset, architecture.as_str());
    let items: Vec<relations::Item> = test.items().collect();

    let device = LibTorchDevice::Cuda(0);

    let predictions = match architecture {
        Architecture::Cnn => {
            infer::<B, cnn::Model<B>>(device, &artifact_dir, vocab, &items, batch_size)?.0
        }
        Architecture::Memory | Architecture::MemoryAdv => {
            infer::<B, memory::Model<B>>(device, &artifact_dir, vocab, &items, batch_size)?.0
        }
        Architecture::MtlRelations => {
            infer::<B, mtl::relations::Model<B>>(device, &artifact_dir, vocab, &items, batch_size)?
                .0
        }
        Architecture::MtlText => {
            infer::<B, mtl::text::Model<B>>(device, &artifact_dir, vocab, &items, batch_size)?.0
        }
    };

    let targets: Vec<usize> = items.iter().map(|item| item.label).collect();
    let report = Report::new(
        &targets,
        &predictions,
        &relations,
        Some(dataset.negative_label()),
    );

    let output = args
        .output
        .unwrap_or_else(|| format!("{artifact_dir}/results.txt"));

    write_results(&output, &predictions, &relations).await?;
    report.save(format!("{artifact_dir}/report.json")).await?;

    println!(
        "{} on {}: accuracy {:.4}, macro-F1 {:.4} (without {})",
        architecture,
        dataset,
        report.accuracy,
        report.macro_f1,
        dataset.negative_label()
    );
    println!("Wrote predictions to {}", output);

    Ok(())
}
