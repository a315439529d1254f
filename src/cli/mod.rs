/// CLI Indexes: Datasets
pub mod datasets;

/// CLI Indexes: Model architectures
pub mod models;
