//! Command line tool to build the vocabulary and the trimmed embedding table of a dataset

use anyhow::anyhow;
use burn_relation_extraction::{cli::datasets::Dataset, pipelines::prepare};
use pico_args::Arguments;

const HELP: &str = "\
Usage: prepare DATASET [OPTIONS]

Arguments:
  DATASET              The dataset to use (e.g., 'semeval')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -w, --word-dim       Pretrained word vector size, 50 (SENNA) or 300 (word2vec) (defaults to 50)
  --text               Add the words of the auxiliary text corpus, needed by 'mtl-text'
";

#[derive(Debug)]
struct Args {
    dataset: String,
    data_dir: Option<String>,
    word_dim: Option<usize>,
    with_text: bool,
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
            with_text: pargs.contains("--text"),
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

    let dataset = Dataset::try_from(args.dataset.as_str())?;
    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());

    let vocab = prepare::prepare(
        &data_dir,
        dataset,
        args.word_dim.unwrap_or(50),
        args.with_text,
    )
    .await?;

    println!(
        "Prepared {} words for {} in {}",
        vocab.len(),
        dataset,
        prepare::generated_dir(&data_dir, dataset).display()
    );

    Ok(())
}
