//! Punto de entrada de alto nivel: payload crudo → run ejecutado.

use std::sync::Arc;

use log::info;
use serde_json::Value;
use tx_core::{AccountContext, CancellationToken, EventStore, FlowEvent, FlowExecutor, FlowRun, FlowSnapshot,
              InMemoryEventStore, StepId};
use tx_flows::{FlowKind, FlowRegistry};
use uuid::Uuid;

use crate::errors::AppError;

pub struct TxFlow<E: EventStore> {
    executor: FlowExecutor<E>,
}

impl TxFlow<InMemoryEventStore> {
    /// Fachada con log de eventos en memoria.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryEventStore::new()))
    }
}

impl<E: EventStore> TxFlow<E> {
    pub fn new(events: Arc<E>) -> Self {
        Self { executor: FlowExecutor::new(events) }
    }

    pub fn executor(&self) -> &FlowExecutor<E> {
        &self.executor
    }

    /// Valida el payload y muestra el plan con nombres legibles, sin enviar
    /// nada.
    pub async fn preview(&self, raw: &Value, account: &AccountContext)
                         -> Result<(FlowKind, Vec<(StepId, String)>), AppError> {
        let (kind, request) = FlowRegistry::validate(raw)?;
        let steps = self.executor.describe(&kind, &request, account).await?;
        Ok((kind, steps))
    }

    /// Valida y ejecuta un run completo.
    pub async fn execute(&self, raw: &Value, account: &AccountContext, cancel: CancellationToken)
                         -> Result<FlowRun, AppError> {
        let (kind, request) = FlowRegistry::validate(raw)?;
        info!("execute flow={} account={}", kind, account.account);
        Ok(self.executor.run(&kind, request, account, cancel).await?)
    }

    pub fn events(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.executor.events(flow_id)
    }

    pub fn snapshot(&self, flow_id: Uuid) -> Option<FlowSnapshot> {
        self.executor.snapshot(flow_id)
    }

    /// Cierra un run terminado: devuelve su snapshot final y suelta su log.
    /// `None` si el run sigue en curso o ya se cerró; un run fallido en la
    /// planificación se descarta igual pero no tiene snapshot.
    pub fn finish(&self, flow_id: Uuid) -> Option<FlowSnapshot> {
        self.executor.discard(flow_id).and_then(|events| FlowSnapshot::from_events(&events))
    }
}
