//! Vocabulary and trimmed embedding tables, generated once per corpus before training.
//!
//! Layout under the data dir:
//!
//! - `<corpus dir>/generated/vocab.txt`
//! - `<corpus dir>/generated/embed<dim>.trim.npy`
//! - `pretrain/embed50.senna.npy` with `pretrain/senna_words.lst`
//! - `pretrain/embed300.google.npy` with `pretrain/google_words.lst`
//! - `imdb/{train,test}.csv` for the auxiliary text corpus

use std::path::{Path, PathBuf};

use burn::data::dataset::Dataset as _;

use crate::{
    datasets::{
        relations, text,
        vocab,
        Corpus, Embeddings, LoadableDataset, Vocabulary,
    },
    utils::files::read_file,
};

/// Directory of the files generated for a corpus
pub fn generated_dir(data_dir: &str, corpus: Corpus) -> PathBuf {
    corpus.dir(data_dir).join("generated")
}

/// The vocabulary file of a corpus
pub fn vocab_path(data_dir: &str, corpus: Corpus) -> PathBuf {
    generated_dir(data_dir, corpus).join("vocab.txt")
}

/// The trimmed embedding table of a corpus
pub fn embeddings_path(data_dir: &str, corpus: Corpus, word_dim: usize) -> PathBuf {
    generated_dir(data_dir, corpus).join(format!("embed{word_dim}.trim.npy"))
}

/// The directory of the auxiliary text corpus
pub fn text_dir(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join(text::DATASET)
}

/// The pretrained matrix and its word list for a word vector size
pub fn pretrained_paths(data_dir: &str, word_dim: usize) -> anyhow::Result<(PathBuf, PathBuf)> {
    let dir = Path::new(data_dir).join("pretrain");

    match word_dim {
        50 => Ok((dir.join("embed50.senna.npy"), dir.join("senna_words.lst"))),
        300 => Ok((dir.join("embed300.google.npy"), dir.join("google_words.lst"))),
        _ => Err(anyhow!(
            "No pretrained embeddings with {} dimensions, use 50 or 300",
            word_dim
        )),
    }
}

/// Build the vocabulary of a corpus (and optionally the text corpus), then trim the pretrained
/// embeddings to it when they are available
pub async fn prepare(
    data_dir: &str,
    corpus: Corpus,
    word_dim: usize,
    with_text: bool,
) -> anyhow::Result<Vocabulary> {
    let dir = corpus.dir(data_dir);

    let (train, test) = futures::try_join!(
        relations::Dataset::load(&dir, "train"),
        relations::Dataset::load(&dir, "test"),
    )?;

    let mut sentences: Vec<Vec<String>> =
        train.items().chain(test.items()).map(|item| item.tokens).collect();

    if with_text {
        let text_dir = text_dir(data_dir);
        let (text_train, text_test) = futures::try_join!(
            text::Dataset::load(&text_dir, "train"),
            text::Dataset::load(&text_dir, "test"),
        )?;

        for documents in [text_train, text_test] {
            for item in documents.iter() {
                sentences.push(item.document()?.words);
            }
        }
    }

    let vocab = Vocabulary::new(vocab::build(sentences.iter().map(Vec::as_slice)))?;

    tokio::fs::create_dir_all(generated_dir(data_dir, corpus)).await?;
    vocab.save(vocab_path(data_dir, corpus)).await?;

    info!("Wrote a vocabulary of {} words", vocab.len());

    let (matrix_path, words_path) = pretrained_paths(data_dir, word_dim)?;

    if !matrix_path.exists() || !words_path.exists() {
        warn!(
            "No pretrained embeddings at {}, models will start from random word vectors",
            matrix_path.display()
        );

        return Ok(vocab);
    }

    let pretrained = Embeddings::load(&matrix_path)?;
    let pretrained_words: Vec<String> = read_file(&words_path)
        .await?
        .into_iter()
        .map(|w| w.trim().to_string())
        .collect();

    let trimmed = pretrained.trim(&pretrained_words, vocab.words(), vocab.pad_id())?;
    trimmed.save(embeddings_path(data_dir, corpus, word_dim))?;

    Ok(vocab)
}

/// Load the trimmed embeddings of a corpus, if they were generated
pub fn load_embeddings(
    data_dir: &str,
    corpus: Corpus,
    word_dim: usize,
) -> anyhow::Result<Option<Embeddings>> {
    let path = embeddings_path(data_dir, corpus, word_dim);

    if !path.exists() {
        warn!("No trimmed embeddings at {}", path.display());

        return Ok(None);
    }

    Ok(Some(Embeddings::load(&path)?))
}
