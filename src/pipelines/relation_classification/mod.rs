/// Common model config and traits for relation classification
pub mod model;

/// Batcher
pub mod batcher;

/// Training
pub mod training;

/// Inference
pub mod inference;

/// Scoring
pub mod evaluation;

pub use batcher::Batcher;
pub use evaluation::Report;
pub use inference::infer;
pub use model::{Model, ModelConfig};
pub use training::train;
