use std::{collections::HashMap, fmt::Display};

use lazy_static::lazy_static;

/// The unique string token for the entity-attention CNN
pub static CNN: &str = "cnn";

/// The unique string token for the memory-network CNN
pub static MEMORY: &str = "memory";

/// The unique string token for the memory-network CNN with adversarial training
pub static MEMORY_ADV: &str = "memory-adv";

/// The unique string token for the per-relation multi-task experts
pub static MTL_RELATIONS: &str = "mtl-relations";

/// The unique string token for joint relation and text classification
pub static MTL_TEXT: &str = "mtl-text";

/// Available model architectures
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Architecture {
    /// CNN with multi-head entity attention
    Cnn,

    /// Memory-network word attention CNN
    Memory,

    /// Memory-network word attention CNN with adversarial and virtual adversarial losses
    MemoryAdv,

    /// Per-relation experts over a shared adversarial encoder
    MtlRelations,

    /// Relation classification trained jointly with text classification
    MtlText,
}

lazy_static! {
    /// Every architecture by its unique string token
    pub static ref ARCHITECTURES: HashMap<&'static str, Architecture> = [
        (CNN, Architecture::Cnn),
        (MEMORY, Architecture::Memory),
        (MEMORY_ADV, Architecture::MemoryAdv),
        (MTL_RELATIONS, Architecture::MtlRelations),
        (MTL_TEXT, Architecture::MtlText),
    ]
    .iter()
    .copied()
    .collect();
}

impl Architecture {
    /// Get the unique string token that identifies this architecture
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Cnn => CNN,
            Architecture::Memory => MEMORY,
            Architecture::MemoryAdv => MEMORY_ADV,
            Architecture::MtlRelations => MTL_RELATIONS,
            Architecture::MtlText => MTL_TEXT,
        }
    }

    /// Whether training also needs the auxiliary text corpus
    pub fn uses_text(&self) -> bool {
        matches!(self, Architecture::MtlText)
    }
}

impl TryFrom<&str> for Architecture {
    type Error = ArchitectureError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ARCHITECTURES
            .get(value.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ArchitectureError::Unknown(value.to_string()))
    }
}

impl Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Architecture Error
#[derive(thiserror::Error, Debug)]
pub enum ArchitectureError {
    /// No architecture found for the given string
    #[error("no model found for {0}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_names_round_trip_through_the_index() {
        for (&name, &architecture) in ARCHITECTURES.iter() {
            assert_eq!(Architecture::try_from(name).unwrap(), architecture);
            assert_eq!(architecture.to_string(), name);
        }

        assert_eq!(Architecture::try_from("Memory-Adv").unwrap(), Architecture::MemoryAdv);
        assert!(Architecture::try_from("bert").is_err());
    }
}
