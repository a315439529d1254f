use std::path::Path;

use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as _,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};

use crate::{
    datasets::{relations, Vocabulary},
    utils::files::write_file,
};

use super::{batcher::Infer, Batcher, Model, ModelConfig};

/// The id of the first sentence of the SemEval-2010 Task 8 test set
pub const FIRST_RESULT_ID: usize = 8001;

/// Define inference function
pub fn infer<B: Backend, M: Model<B>>(
    device: B::Device,           // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str,          // Directory containing model and config files
    vocab: Vocabulary,           // Vocabulary used during training
    items: &[relations::Item],   // Examples to classify
    batch_size: usize,           // Examples per forward pass
) -> anyhow::Result<(Vec<usize>, M::Config)> {
    // Load experiment configuration
    let config = M::Config::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

    let batcher = Batcher::<B>::new(vocab, config.max_len(), device.clone());

    // Load trained model weights
    info!("Loading weights...");

    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), &device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    // Create model using loaded weights
    info!("Creating model...");

    let model = M::init(&config, None, &device).load_record(record);

    // Run inference on the given examples
    info!("Running inference on {} examples...", items.len());

    let mut predictions = Vec::with_capacity(items.len());

    for chunk in items.chunks(batch_size.max(1)) {
        let input: Infer<B> = batcher.batch(chunk.to_vec());

        let classes = model
            .classify(input)
            .argmax(1)
            .into_data()
            .convert::<i64>()
            .value;

        predictions.extend(classes.into_iter().map(|c| c as usize));
    }

    Ok((predictions, config))
}

/// Render predictions as `<id>\t<relation>` lines, numbered from [FIRST_RESULT_ID]
pub fn format_results(
    predictions: &[usize],
    relations: &relations::Relations,
) -> anyhow::Result<Vec<String>> {
    predictions
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            let name = relations
                .name(class)
                .ok_or_else(|| anyhow!("Predicted class {} has no relation name", class))?;

            Ok(format!("{}\t{}", FIRST_RESULT_ID + i, name))
        })
        .collect()
}

/// Write predictions in the format read by the SemEval scorer
pub async fn write_results(
    path: impl AsRef<Path>,
    predictions: &[usize],
    relations: &relations::Relations,
) -> anyhow::Result<()> {
    let lines = format_results(predictions, relations)?;

    write_file(path, &lines).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_results_are_numbered_from_first_test_id() {
        let relations = relations::Relations {
            labels: vec!["Other".to_string(), "Cause-Effect(e1,e2)".to_string()],
        };

        let lines = format_results(&[1, 0], &relations).unwrap();

        assert_eq!(lines, vec!["8001\tCause-Effect(e1,e2)", "8002\tOther"]);
        assert!(format_results(&[5], &relations).is_err());
    }
}
