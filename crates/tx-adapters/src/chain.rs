//! Cadena en memoria guionable.
//!
//! Un único objeto cumple los cuatro puertos de cadena (wallet, recibos,
//! relay e índice) para que las pruebas puedan observar el efecto de cada
//! envío. Las lecturas se guionan por `(contrato, función, args)` o con
//! comodín por `(contrato, función)`; los envíos pueden fallar o revertir
//! según lo guionado por nombre de función.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use tx_core::{CallValue, ChainError, ContractCall, IndexError, LocalStateStore, Ports, RawTransaction, ReadIndex,
              Receipt, ReceiptSource, ReceiptStatus, Relay, RelayStatus, Wallet};
use tx_domain::{BranchId, TroveId, VoteAllocation};

/// Resultado final de una transacción enviada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Mined,
    Reverted(Option<String>),
    Dropped,
}

#[derive(Debug, Clone)]
struct SentTx {
    block: u64,
    outcome: Outcome,
    pending_polls: u32,
}

#[derive(Debug, Clone)]
struct Proposal {
    executes_as: B256,
    awaiting_polls: u32,
    rejected: bool,
}

type ReadKey = (Address, String, Vec<CallValue>);

#[derive(Default)]
struct ChainState {
    block: u64,
    nonce: u64,
    relayed: bool,
    reads: HashMap<ReadKey, CallValue>,
    wildcard_reads: HashMap<(Address, String), CallValue>,
    submit_failures: HashMap<String, VecDeque<ChainError>>,
    outcomes: HashMap<String, VecDeque<Outcome>>,
    pending_polls: u32,
    relay_awaiting_polls: u32,
    reject_proposals: bool,
    writes: Vec<ContractCall>,
    raw: Vec<RawTransaction>,
    sent: HashMap<B256, SentTx>,
    proposals: HashMap<B256, Proposal>,
    index_heads: VecDeque<Result<u64, IndexError>>,
    index_polls: u32,
    troves: HashMap<(BranchId, Address, u64), TroveId>,
    allocations: HashMap<Address, Vec<VoteAllocation>>,
    allocations_down: bool,
    receipt_polls: u32,
}

fn tagged_hash(tag: u8, n: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[0] = tag;
    bytes[24..].copy_from_slice(&n.to_be_bytes());
    B256::from(bytes)
}

#[derive(Default)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Puertos del motor respaldados por esta cadena.
    pub fn ports(self: &Arc<Self>, local_state: Arc<dyn LocalStateStore>) -> Ports {
        Ports { wallet: self.clone(),
                receipts: self.clone(),
                relay: Some(self.clone() as Arc<dyn Relay>),
                index: self.clone(),
                local_state }
    }

    /// Los envíos devuelven hashes de propuesta del relay (cuenta multisig).
    pub fn set_relayed(&self, relayed: bool) {
        self.state.lock().relayed = relayed;
    }

    pub fn set_block(&self, block: u64) {
        self.state.lock().block = block;
    }

    pub fn block(&self) -> u64 {
        self.state.lock().block
    }

    pub fn set_read(&self, to: Address, function: &str, args: Vec<CallValue>, value: CallValue) {
        self.state.lock().reads.insert((to, function.to_string(), args), value);
    }

    /// Respuesta para cualquier combinación de argumentos.
    pub fn set_read_any(&self, to: Address, function: &str, value: CallValue) {
        self.state.lock().wildcard_reads.insert((to, function.to_string()), value);
    }

    /// El próximo envío de `function` falla en la wallet con `error`.
    pub fn fail_submit(&self, function: &str, error: ChainError) {
        self.state
            .lock()
            .submit_failures
            .entry(function.to_string())
            .or_default()
            .push_back(error);
    }

    /// Resultado del próximo envío de `function` (por defecto `Mined`).
    pub fn script_outcome(&self, function: &str, outcome: Outcome) {
        self.state.lock().outcomes.entry(function.to_string()).or_default().push_back(outcome);
    }

    /// Consultas `Pending` antes de que cada transacción resuelva.
    pub fn set_pending_polls(&self, polls: u32) {
        self.state.lock().pending_polls = polls;
    }

    /// Consultas `AwaitingSignatures` antes de ejecutar cada propuesta.
    pub fn set_relay_awaiting_polls(&self, polls: u32) {
        self.state.lock().relay_awaiting_polls = polls;
    }

    pub fn reject_proposals(&self) {
        self.state.lock().reject_proposals = true;
    }

    /// Alturas devueltas por el índice; agotadas, el índice reporta el
    /// bloque actual de la cadena.
    pub fn script_index_heads(&self, heads: Vec<Result<u64, IndexError>>) {
        self.state.lock().index_heads.extend(heads);
    }

    pub fn set_trove(&self, branch: BranchId, owner: Address, owner_index: u64, trove: TroveId) {
        self.state.lock().troves.insert((branch, owner, owner_index), trove);
    }

    pub fn set_allocations(&self, account: Address, allocations: Vec<VoteAllocation>) {
        self.state.lock().allocations.insert(account, allocations);
    }

    /// Las consultas de asignaciones de voto fallan (índice caído).
    pub fn set_allocations_unavailable(&self, down: bool) {
        self.state.lock().allocations_down = down;
    }

    /// Llamadas enviadas con `write_contract`, en orden.
    pub fn writes(&self) -> Vec<ContractCall> {
        self.state.lock().writes.clone()
    }

    pub fn written_functions(&self) -> Vec<String> {
        self.state.lock().writes.iter().map(|c| c.function.clone()).collect()
    }

    pub fn raw_transactions(&self) -> Vec<RawTransaction> {
        self.state.lock().raw.clone()
    }

    pub fn index_polls(&self) -> u32 {
        self.state.lock().index_polls
    }

    pub fn receipt_polls(&self) -> u32 {
        self.state.lock().receipt_polls
    }

    fn submit(&self, function: &str) -> Result<B256, ChainError> {
        let mut st = self.state.lock();
        if let Some(err) = st.submit_failures.get_mut(function).and_then(|q| q.pop_front()) {
            debug!("in-memory submit rejected function={} err={}", function, err);
            return Err(err);
        }
        st.nonce += 1;
        st.block += 1;
        let nonce = st.nonce;
        let tx_hash = tagged_hash(0xee, nonce);
        let outcome = st.outcomes
                        .get_mut(function)
                        .and_then(|q| q.pop_front())
                        .unwrap_or(Outcome::Mined);
        let sent = SentTx { block: st.block,
                            outcome,
                            pending_polls: st.pending_polls };
        st.sent.insert(tx_hash, sent);
        if st.relayed {
            let safe_hash = tagged_hash(0x5a, nonce);
            let proposal = Proposal { executes_as: tx_hash,
                                      awaiting_polls: st.relay_awaiting_polls,
                                      rejected: st.reject_proposals };
            st.proposals.insert(safe_hash, proposal);
            return Ok(safe_hash);
        }
        Ok(tx_hash)
    }
}

#[async_trait]
impl Wallet for InMemoryChain {
    async fn write_contract(&self, call: &ContractCall) -> Result<B256, ChainError> {
        let hash = self.submit(&call.function)?;
        self.state.lock().writes.push(call.clone());
        Ok(hash)
    }

    async fn read_contract(&self, call: &ContractCall) -> Result<CallValue, ChainError> {
        let st = self.state.lock();
        let key = (call.to, call.function.clone(), call.args.clone());
        st.reads
          .get(&key)
          .or_else(|| st.wildcard_reads.get(&(call.to, call.function.clone())))
          .cloned()
          .ok_or_else(|| ChainError::Transport(format!("no scripted read for {call}")))
    }

    async fn send_raw_transaction(&self, tx: &RawTransaction) -> Result<B256, ChainError> {
        let hash = self.submit("multiSend")?;
        self.state.lock().raw.push(tx.clone());
        Ok(hash)
    }
}

#[async_trait]
impl ReceiptSource for InMemoryChain {
    async fn transaction_receipt(&self, hash: B256) -> Result<ReceiptStatus, ChainError> {
        let mut st = self.state.lock();
        st.receipt_polls += 1;
        let Some(tx) = st.sent.get_mut(&hash) else {
            return Ok(ReceiptStatus::Dropped);
        };
        if tx.pending_polls > 0 {
            tx.pending_polls -= 1;
            return Ok(ReceiptStatus::Pending);
        }
        let receipt = Receipt { tx_hash: hash,
                                block_number: tx.block };
        Ok(match &tx.outcome {
            Outcome::Mined => ReceiptStatus::Mined(receipt),
            Outcome::Reverted(reason) => ReceiptStatus::Reverted { receipt,
                                                                   reason: reason.clone() },
            Outcome::Dropped => ReceiptStatus::Dropped,
        })
    }
}

#[async_trait]
impl Relay for InMemoryChain {
    async fn relay_status(&self, safe_tx_hash: B256) -> Result<RelayStatus, ChainError> {
        let mut st = self.state.lock();
        let Some(p) = st.proposals.get_mut(&safe_tx_hash) else {
            return Err(ChainError::Transport(format!("unknown proposal {safe_tx_hash}")));
        };
        if p.rejected {
            return Ok(RelayStatus::Rejected { reason: Some("rejected by owners".into()) });
        }
        if p.awaiting_polls > 0 {
            p.awaiting_polls -= 1;
            return Ok(RelayStatus::AwaitingSignatures { confirmations: 1,
                                                        threshold: 2 });
        }
        Ok(RelayStatus::Executed { tx_hash: p.executes_as })
    }
}

#[async_trait]
impl ReadIndex for InMemoryChain {
    async fn indexed_block_number(&self) -> Result<u64, IndexError> {
        let mut st = self.state.lock();
        st.index_polls += 1;
        match st.index_heads.pop_front() {
            Some(head) => head,
            None => Ok(st.block),
        }
    }

    async fn find_trove(&self, branch: BranchId, owner: Address, owner_index: u64)
                        -> Result<Option<TroveId>, IndexError> {
        Ok(self.state.lock().troves.get(&(branch, owner, owner_index)).copied())
    }

    async fn vote_allocations(&self, account: Address) -> Result<Vec<VoteAllocation>, IndexError> {
        let st = self.state.lock();
        if st.allocations_down {
            return Err(IndexError::Unavailable("governance index unreachable".into()));
        }
        Ok(st.allocations.get(&account).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    #[tokio::test]
    async fn reads_prefer_exact_args_over_wildcard() {
        let chain = InMemoryChain::new();
        let token = Address::repeat_byte(1);
        let owner = Address::repeat_byte(2);
        chain.set_read_any(token, "balanceOf", CallValue::from(U256::from(1u64)));
        chain.set_read(token, "balanceOf", vec![owner.into()], CallValue::from(U256::from(9u64)));
        let exact = ContractCall::new(token, "balanceOf", vec![owner.into()]);
        let other = ContractCall::new(token, "balanceOf", vec![Address::ZERO.into()]);
        assert_eq!(chain.read_contract(&exact).await.unwrap(), CallValue::from(U256::from(9u64)));
        assert_eq!(chain.read_contract(&other).await.unwrap(), CallValue::from(U256::from(1u64)));
        assert!(chain.read_contract(&ContractCall::new(token, "decimals", vec![])).await.is_err());
    }

    #[tokio::test]
    async fn scripted_outcomes_and_failures() {
        let chain = InMemoryChain::new();
        chain.fail_submit("approve", ChainError::UserRejected);
        chain.script_outcome("provideToSP", Outcome::Reverted(Some("boom".into())));
        chain.set_pending_polls(1);
        let approve = ContractCall::new(Address::ZERO, "approve", vec![]);
        assert_eq!(chain.write_contract(&approve).await, Err(ChainError::UserRejected));
        let hash = chain.write_contract(&ContractCall::new(Address::ZERO, "provideToSP", vec![]))
                        .await
                        .unwrap();
        assert_eq!(chain.transaction_receipt(hash).await.unwrap(), ReceiptStatus::Pending);
        assert!(matches!(chain.transaction_receipt(hash).await.unwrap(), ReceiptStatus::Reverted { .. }));
        assert_eq!(chain.written_functions(), vec!["provideToSP".to_string()]);
        assert_eq!(chain.transaction_receipt(B256::ZERO).await.unwrap(), ReceiptStatus::Dropped);
    }

    #[tokio::test]
    async fn relayed_submissions_resolve_through_proposals() {
        let chain = InMemoryChain::new();
        chain.set_relayed(true);
        chain.set_relay_awaiting_polls(1);
        let safe = chain.write_contract(&ContractCall::new(Address::ZERO, "claimRewards", vec![]))
                        .await
                        .unwrap();
        assert!(matches!(chain.relay_status(safe).await.unwrap(), RelayStatus::AwaitingSignatures { .. }));
        let RelayStatus::Executed { tx_hash } = chain.relay_status(safe).await.unwrap() else {
            panic!("proposal should have executed");
        };
        assert_ne!(tx_hash, safe);
        assert!(matches!(chain.transaction_receipt(tx_hash).await.unwrap(), ReceiptStatus::Mined(_)));
    }

    #[tokio::test]
    async fn index_follows_script_then_chain_head() {
        let chain = InMemoryChain::new();
        chain.set_block(10);
        chain.script_index_heads(vec![Ok(8), Err(IndexError::Unavailable("502".into()))]);
        assert_eq!(chain.indexed_block_number().await, Ok(8));
        assert!(chain.indexed_block_number().await.is_err());
        assert_eq!(chain.indexed_block_number().await, Ok(10));
        assert_eq!(chain.index_polls(), 3);
    }
}
