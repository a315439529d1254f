/// Paired relation and text batches
pub mod batcher;

/// Pairing of the relation corpus with the text corpus
pub mod dataset;

/// Training
pub mod training;

pub use batcher::{Batcher, Text, Train};
pub use dataset::Paired;
pub use training::train;
