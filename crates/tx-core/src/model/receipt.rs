use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Camino de ejecución de una transacción enviada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPath {
    /// EOA: el hash es el de la transacción on-chain.
    Direct,
    /// Multisig: el hash identifica la propuesta en el relay; el hash on-chain
    /// se conoce recién cuando el relay la ejecuta.
    Relayed,
}

/// Referencia a una transacción enviada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRef {
    pub hash: B256,
    pub path: ExecutionPath,
}

impl TxRef {
    pub fn direct(hash: B256) -> Self {
        Self { hash, path: ExecutionPath::Direct }
    }

    pub fn relayed(hash: B256) -> Self {
        Self { hash, path: ExecutionPath::Relayed }
    }
}

/// Recibo de inclusión. Misma forma para ambos caminos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
}

/// Respuesta del nodo al consultar un recibo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    Pending,
    Mined(Receipt),
    Reverted { receipt: Receipt, reason: Option<String> },
    /// El nodo ya no conoce la transacción (reemplazada o descartada).
    Dropped,
}

/// Estado de una propuesta en el relay multisig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayStatus {
    AwaitingSignatures { confirmations: u32, threshold: u32 },
    Executed { tx_hash: B256 },
    Rejected { reason: Option<String> },
}
