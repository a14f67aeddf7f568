use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Índice de un branch de colateral (0 = ETH nativo en el despliegue estándar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(u8);

impl BranchId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identificador on-chain de una posición (trove).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TroveId(pub U256);

impl fmt::Display for TroveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
