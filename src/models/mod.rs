/// Shared neural building blocks
pub mod layers;

/// CNN with entity attention
pub mod cnn;

/// Memory-network word attention CNN
pub mod memory;

/// Adversarial multi-task CNNs
pub mod mtl;
