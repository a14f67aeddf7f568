use thiserror::Error;

use crate::BranchId;

/// Error del dominio del protocolo.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    Validation(String),

    #[error("Branch desconocido: {0}")]
    UnknownBranch(BranchId),

    #[error("Desbordamiento aritmético: {0}")]
    Overflow(String),

    #[error("Pérdida de precisión: {0}")]
    PrecisionLoss(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(DomainError::Validation("x".into()).to_string(), "Error de validación: x");
        assert_eq!(DomainError::UnknownBranch(BranchId::new(7)).to_string(), "Branch desconocido: 7");
    }
}
