//! CNN with multi-head entity attention

/// Model configuration
pub mod config;

/// Model definition
pub mod model;

/// Relation Classification adapter
pub mod relation_classification;

pub use config::Config;
pub use model::Model;
