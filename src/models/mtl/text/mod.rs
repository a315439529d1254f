/// Model configuration
pub mod config;

/// Model definition
pub mod model;

/// Relation Classification adapter, used for inference
pub mod relation_classification;

/// Joint training on paired batches
pub mod multi_task;

pub use config::Config;
pub use model::Model;
