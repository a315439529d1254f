//! Adversarial multi-task CNNs: a shared encoder that a discriminator must not be able to read
//! the task from, next to task-private encoders

/// One binary expert per relation over a shared, gradient-reversed encoder
pub mod relations;

/// Relation classification trained jointly with an auxiliary text classification task
pub mod text;
