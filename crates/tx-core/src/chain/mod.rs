//! Puertos hacia los colaboradores externos: wallet, nodo, relay multisig,
//! índice de lectura y almacenamiento local durable.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::Value;
use tx_domain::{BranchId, TroveId, VoteAllocation};

use crate::errors::{ChainError, IndexError, LocalStateError};
use crate::model::{CallValue, ContractCall, RawTransaction, ReceiptStatus, RelayStatus};

/// Wallet de la cuenta conectada. Para cuentas multisig el hash devuelto
/// por los envíos identifica la propuesta en el relay.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn write_contract(&self, call: &ContractCall) -> Result<B256, ChainError>;
    async fn read_contract(&self, call: &ContractCall) -> Result<CallValue, ChainError>;
    async fn send_raw_transaction(&self, tx: &RawTransaction) -> Result<B256, ChainError>;
}

#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn transaction_receipt(&self, hash: B256) -> Result<ReceiptStatus, ChainError>;
}

#[async_trait]
pub trait Relay: Send + Sync {
    async fn relay_status(&self, safe_tx_hash: B256) -> Result<RelayStatus, ChainError>;
}

/// Índice de lectura (subgraph). Va por detrás de la cadena.
#[async_trait]
pub trait ReadIndex: Send + Sync {
    async fn indexed_block_number(&self) -> Result<u64, IndexError>;
    async fn find_trove(&self, branch: BranchId, owner: Address, owner_index: u64)
                        -> Result<Option<TroveId>, IndexError>;
    async fn vote_allocations(&self, account: Address) -> Result<Vec<VoteAllocation>, IndexError>;
}

/// Estado local durable. El motor sólo escribe (merge); nunca lo lee.
pub trait LocalStateStore: Send + Sync {
    fn merge(&self, key: &str, patch: Value) -> Result<(), LocalStateError>;
}
