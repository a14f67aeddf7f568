//! Vista del progreso de un run reconstruida a partir de su log de eventos.
//!
//! El replay es lineal: se consumen los eventos en orden y se actualiza cada
//! slot. Sirve a las UIs para mostrar "esperando firma", "confirmando" o
//! "sincronizando índice" mientras el run está suspendido.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::SIGNAL_INDEX_LAGGING;
use crate::event::{FlowEvent, FlowEventKind};
use crate::model::{Receipt, TxRef};
use crate::step::{StepId, StepPhase};

#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub step_id: StepId,
    pub phase: StepPhase,
    pub tx: Option<TxRef>,
    pub receipt: Option<Receipt>,
    pub error: Option<String>,
    /// Cantidad de consultas al índice que lo encontraron atrasado.
    pub index_lag_polls: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowSnapshot {
    pub flow_id: Uuid,
    pub flow: String,
    pub plan_hash: String,
    pub relayed: bool,
    pub steps: Vec<StepView>,
    /// Primer paso no confirmado (o `steps.len()` si todos lo están).
    pub cursor: usize,
    pub completed: bool,
    pub failure: Option<String>,
    /// El paso actual ya fue incluido pero el índice todavía no lo refleja.
    pub waiting_on_index: bool,
}

impl FlowSnapshot {
    /// Reconstruye el snapshot. `None` si el log no empieza con `FlowPlanned`
    /// (run fallido durante la planificación o inexistente).
    pub fn from_events(events: &[FlowEvent]) -> Option<Self> {
        let first = events.first()?;
        let FlowEventKind::FlowPlanned { flow,
                                         steps,
                                         plan_hash,
                                         relayed, } = &first.kind
        else {
            return None;
        };
        let mut snap = FlowSnapshot { flow_id: first.flow_id,
                                      flow: flow.clone(),
                                      plan_hash: plan_hash.clone(),
                                      relayed: *relayed,
                                      steps: steps.iter()
                                                  .map(|id| StepView { step_id: id.clone(),
                                                                       phase: StepPhase::Idle,
                                                                       tx: None,
                                                                       receipt: None,
                                                                       error: None,
                                                                       index_lag_polls: 0,
                                                                       started_at: None,
                                                                       finished_at: None })
                                                  .collect(),
                                      cursor: 0,
                                      completed: false,
                                      failure: None,
                                      waiting_on_index: false };

        for ev in &events[1..] {
            match &ev.kind {
                FlowEventKind::FlowPlanned { .. } => {}
                FlowEventKind::StepAwaitingSignature { step_index, .. } => {
                    if let Some(slot) = snap.steps.get_mut(*step_index) {
                        slot.phase = StepPhase::AwaitingSignature;
                        slot.started_at = Some(ev.ts);
                    }
                }
                FlowEventKind::StepSubmitted { step_index, tx, .. } => {
                    if let Some(slot) = snap.steps.get_mut(*step_index) {
                        slot.phase = StepPhase::Submitted;
                        slot.tx = Some(*tx);
                    }
                }
                FlowEventKind::StepConfirmed { step_index, receipt, .. } => {
                    if let Some(slot) = snap.steps.get_mut(*step_index) {
                        slot.phase = StepPhase::Confirmed;
                        slot.receipt = Some(*receipt);
                        slot.finished_at = Some(ev.ts);
                    }
                    snap.waiting_on_index = false;
                }
                FlowEventKind::StepFailed { step_index, error, .. } => {
                    if let Some(slot) = snap.steps.get_mut(*step_index) {
                        slot.phase = StepPhase::Failed;
                        slot.error = Some(error.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                    snap.waiting_on_index = false;
                }
                FlowEventKind::StepSignal { step_index: Some(step_index),
                                            signal, .. }
                    if signal == SIGNAL_INDEX_LAGGING =>
                {
                    if let Some(slot) = snap.steps.get_mut(*step_index) {
                        slot.index_lag_polls += 1;
                    }
                    snap.waiting_on_index = true;
                }
                FlowEventKind::StepSignal { .. } => {}
                FlowEventKind::FlowFailed { error } => {
                    snap.failure = Some(error.clone());
                    snap.waiting_on_index = false;
                }
                FlowEventKind::FlowCompleted { .. } => snap.completed = true,
            }
        }
        snap.cursor = snap.steps
                          .iter()
                          .position(|s| s.phase != StepPhase::Confirmed)
                          .unwrap_or(snap.steps.len());
        Some(snap)
    }

    pub fn current(&self) -> Option<&StepView> {
        self.steps.get(self.cursor)
    }
}
