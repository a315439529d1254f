/// Filter banks with max-pooling, and same-length convolution blocks
pub mod conv;

/// Linear layers that report their L2 penalty
pub mod dense;

/// Gradient reversal
pub mod gradient;

/// Adversarial and virtual adversarial perturbations
pub mod adversarial;

/// Entity attention and memory word attention
pub mod attention;

/// Word and position embedding tables
pub mod embedding;

pub use attention::{EntityAttention, EntityAttentionConfig, WordAttention, WordAttentionConfig};
pub use conv::{ConvBlock, ConvBlockConfig, ConvPool, ConvPoolConfig};
pub use dense::{Dense, DenseConfig};
pub use embedding::{PositionEmbeddingConfig, WordEmbedding, WordEmbeddingConfig};
