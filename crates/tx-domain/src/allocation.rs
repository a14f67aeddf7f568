use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Sentido de una asignación de voto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    For,
    Against,
}

/// Asignación de voto de un stake hacia un destinatario (iniciativa).
///
/// En la práctica sólo uno de los dos montos es distinto de cero, pero el tipo
/// no lo impone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAllocation {
    pub recipient: Address,
    pub for_amount: U256,
    pub against_amount: U256,
}

impl VoteAllocation {
    pub fn new(recipient: Address, for_amount: U256, against_amount: U256) -> Self {
        Self { recipient,
               for_amount,
               against_amount }
    }

    /// Suma saturada de ambos sentidos.
    pub fn total(&self) -> U256 {
        self.for_amount.saturating_add(self.against_amount)
    }

    pub fn direction(&self) -> VoteDirection {
        if self.for_amount > self.against_amount {
            VoteDirection::For
        } else {
            VoteDirection::Against
        }
    }
}
