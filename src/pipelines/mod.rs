/// Shared experiment configuration
pub mod config;

/// Vocabulary and embedding preparation
pub mod prepare;

/// Relation Classification
pub mod relation_classification;

/// Joint relation and text classification
pub mod multi_task;
