//! Tipos de evento del run.
//!
//! Cada transición de estado de un paso se registra antes de la siguiente,
//! de modo que el orden del log es el orden real de ejecución. El log
//! permite reconstruir el progreso (`FlowSnapshot`) mientras el run está
//! suspendido esperando firma, confirmación o índice.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Receipt, TxRef};
use crate::step::StepId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Primer evento de un run: fija la lista de pasos y el hash del plan.
    FlowPlanned {
        flow: String,
        steps: Vec<StepId>,
        plan_hash: String,
        relayed: bool,
    },
    StepAwaitingSignature { step_index: usize, step_id: StepId },
    StepSubmitted { step_index: usize, step_id: StepId, tx: TxRef },
    StepConfirmed { step_index: usize, step_id: StepId, receipt: Receipt },
    StepFailed { step_index: usize, step_id: StepId, error: String },
    /// Hito ligero que no altera el estado (índice atrasado, colisión de
    /// owner index). Puede emitirse durante la planificación, sin paso.
    StepSignal {
        step_index: Option<usize>,
        step_id: Option<StepId>,
        signal: String,
        data: serde_json::Value,
    },
    /// El run terminó sin completar (planificación o paso fallido).
    FlowFailed { error: String },
    FlowCompleted { plan_hash: String },
}

impl FlowEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEventKind::FlowPlanned { .. } => "FlowPlanned",
            FlowEventKind::StepAwaitingSignature { .. } => "StepAwaitingSignature",
            FlowEventKind::StepSubmitted { .. } => "StepSubmitted",
            FlowEventKind::StepConfirmed { .. } => "StepConfirmed",
            FlowEventKind::StepFailed { .. } => "StepFailed",
            FlowEventKind::StepSignal { .. } => "StepSignal",
            FlowEventKind::FlowFailed { .. } => "FlowFailed",
            FlowEventKind::FlowCompleted { .. } => "FlowCompleted",
        }
    }

    /// Cierra el log de un run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowEventKind::FlowCompleted { .. } | FlowEventKind::FlowFailed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64,
    pub flow_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>,
}
