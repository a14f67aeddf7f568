use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Preferencia del usuario para el monto de las aprobaciones ERC20.
///
/// Se toma una copia al iniciar un run; el motor nunca la modifica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// Aprueba exactamente lo que el paso va a gastar.
    #[default]
    Exact,
    /// Aprueba `U256::MAX`.
    Infinite,
}

impl ApprovalPolicy {
    pub fn amount_for(&self, required: U256) -> U256 {
        match self {
            ApprovalPolicy::Exact => required,
            ApprovalPolicy::Infinite => U256::MAX,
        }
    }
}

impl FromStr for ApprovalPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "infinite" => Ok(Self::Infinite),
            other => Err(DomainError::Validation(format!("unknown approval policy: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_depends_on_policy() {
        let req = U256::from(100u64);
        assert_eq!(ApprovalPolicy::Exact.amount_for(req), req);
        assert_eq!(ApprovalPolicy::Infinite.amount_for(req), U256::MAX);
        assert_eq!("INFINITE".parse::<ApprovalPolicy>().unwrap(), ApprovalPolicy::Infinite);
        assert!("some".parse::<ApprovalPolicy>().is_err());
    }
}
