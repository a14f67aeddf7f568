use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{FlowEvent, FlowEventKind};

/// Almacenamiento de eventos append-only. Compartido entre el executor y los
/// lectores de snapshots, por eso opera sobre `&self`.
pub trait EventStore: Send + Sync {
    /// Agrega un evento y devuelve el evento completo (con seq y ts).
    fn append_kind(&self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent;
    /// Eventos de un run en orden ascendente de seq.
    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent>;
    /// Quita el log de un run y lo devuelve (vacío si no existía).
    fn discard(&self, flow_id: Uuid) -> Vec<FlowEvent>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    inner: DashMap<Uuid, Vec<FlowEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flow_ids(&self) -> Vec<Uuid> {
        self.inner.iter().map(|e| *e.key()).collect()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        let mut events = self.inner.entry(flow_id).or_default();
        let ev = FlowEvent { seq: events.len() as u64,
                             flow_id,
                             kind,
                             ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.inner.get(&flow_id).map(|v| v.clone()).unwrap_or_default()
    }

    fn discard(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.inner.remove(&flow_id).map(|(_, events)| events).unwrap_or_default()
    }
}
