//! Contexto entregado a planificadores y pasos.

use alloy_primitives::Address;
use log::debug;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tx_domain::{ApprovalPolicy, Contracts};
use uuid::Uuid;

use crate::barrier::{BarrierReport, ConsistencyBarrier};
use crate::constants::SIGNAL_INDEX_LAGGING;
use crate::errors::FlowError;
use crate::event::{EventStore, FlowEventKind};
use crate::model::{AccountContext, CallValue, ContractCall, FlowRequest, RawTransaction, TxRef};
use crate::step::StepId;
use crate::wait::or_cancel;

/// Vista de un run para un paso (o para el planificador, sin paso).
///
/// Es la única vía por la que los pasos leen cadena, envían transacciones,
/// consultan el índice o escriben estado local.
pub struct FlowCtx<'a> {
    pub account: &'a AccountContext,
    pub request: &'a FlowRequest,
    pub flow_id: Uuid,
    events: &'a dyn EventStore,
    cancel: &'a CancellationToken,
    step: Option<(usize, StepId)>,
}

impl<'a> FlowCtx<'a> {
    pub fn new(account: &'a AccountContext, request: &'a FlowRequest, flow_id: Uuid, events: &'a dyn EventStore,
               cancel: &'a CancellationToken)
               -> Self {
        Self { account,
               request,
               flow_id,
               events,
               cancel,
               step: None }
    }

    /// Mismo contexto, posicionado en el paso `index`.
    pub fn for_step(&self, index: usize, id: StepId) -> FlowCtx<'a> {
        FlowCtx { account: self.account,
                  request: self.request,
                  flow_id: self.flow_id,
                  events: self.events,
                  cancel: self.cancel,
                  step: Some((index, id)) }
    }

    pub fn step_id(&self) -> Option<&StepId> {
        self.step.as_ref().map(|(_, id)| id)
    }

    pub fn owner(&self) -> Address {
        self.account.account
    }

    pub fn contracts(&self) -> &Contracts {
        &self.account.contracts
    }

    pub fn approval_policy(&self) -> ApprovalPolicy {
        self.account.approval_policy
    }

    pub fn is_relayed(&self) -> bool {
        self.account.relayed
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        self.cancel
    }

    pub async fn read(&self, call: &ContractCall) -> Result<CallValue, FlowError> {
        or_cancel(self.cancel, async {
            self.account.ports.wallet.read_contract(call).await.map_err(FlowError::from)
        }).await
    }

    /// Envía una llamada. El camino del `TxRef` depende del tipo de cuenta.
    pub async fn write(&self, call: &ContractCall) -> Result<TxRef, FlowError> {
        debug!("submit flow_id={} step={:?} call={}", self.flow_id, self.step_id(), call);
        let hash = or_cancel(self.cancel, async {
                       self.account.ports.wallet.write_contract(call).await.map_err(FlowError::from)
                   }).await?;
        Ok(TxRef { hash,
                   path: self.account.execution_path() })
    }

    pub async fn send_raw(&self, tx: &RawTransaction) -> Result<TxRef, FlowError> {
        debug!("submit raw flow_id={} step={:?} calls={}", self.flow_id, self.step_id(), tx.calls.len());
        let hash = or_cancel(self.cancel, async {
                       self.account.ports.wallet.send_raw_transaction(tx).await.map_err(FlowError::from)
                   }).await?;
        Ok(TxRef { hash,
                   path: self.account.execution_path() })
    }

    /// Emite una señal ligera asociada al paso actual.
    pub fn signal(&self, signal: &str, data: Value) {
        let (step_index, step_id) = match &self.step {
            Some((i, id)) => (Some(*i), Some(id.clone())),
            None => (None, None),
        };
        self.events.append_kind(self.flow_id,
                                FlowEventKind::StepSignal { step_index,
                                                            step_id,
                                                            signal: signal.to_string(),
                                                            data });
    }

    /// Espera a que el índice de lectura alcance `block`, emitiendo
    /// `index_lagging` en cada consulta atrasada.
    pub async fn await_indexed(&self, block: u64) -> Result<BarrierReport, FlowError> {
        let barrier = ConsistencyBarrier::new(self.account.ports.index.clone())
            .with_timeout(self.account.config.index_timeout)
            .with_cancel(self.cancel.clone());
        barrier.await_indexed_with(block, |lag| {
                   self.signal(SIGNAL_INDEX_LAGGING,
                               json!({ "target": lag.target,
                                       "seen": lag.seen,
                                       "attempt": lag.attempt,
                                       "retryInMs": lag.next_delay.as_millis() as u64 }))
               })
               .await
    }

    /// Merge en el estado local durable.
    pub fn merge_local(&self, key: &str, patch: Value) -> Result<(), FlowError> {
        let store = &self.account.ports.local_state;
        store.merge(key, patch).map_err(|e| FlowError::LocalState(e.to_string()))
    }
}
