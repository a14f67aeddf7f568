use serde::{Deserialize, Serialize};

use crate::errors::FlowError;
use crate::model::{Receipt, TxRef};

/// Estado de un paso en tiempo de ejecución.
///
/// Transiciones válidas:
/// - `Idle` -> `AwaitingSignature` -> `Submitted` -> `Confirmed`
/// - cualquier estado no terminal -> `Failed`
///
/// `Confirmed` y `Failed` son terminales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Idle,
    AwaitingSignature,
    Submitted(TxRef),
    Confirmed(Receipt),
    Failed(FlowError),
}

/// Fase sin datos asociados, usada en snapshots y logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepPhase {
    Idle,
    AwaitingSignature,
    Submitted,
    Confirmed,
    Failed,
}

impl StepPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepPhase::Idle => "idle",
            StepPhase::AwaitingSignature => "awaiting_signature",
            StepPhase::Submitted => "submitted",
            StepPhase::Confirmed => "confirmed",
            StepPhase::Failed => "failed",
        }
    }
}

impl StepStatus {
    pub fn phase(&self) -> StepPhase {
        match self {
            StepStatus::Idle => StepPhase::Idle,
            StepStatus::AwaitingSignature => StepPhase::AwaitingSignature,
            StepStatus::Submitted(_) => StepPhase::Submitted,
            StepStatus::Confirmed(_) => StepPhase::Confirmed,
            StepStatus::Failed(_) => StepPhase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Confirmed(_) | StepStatus::Failed(_))
    }

    pub fn can_transition_to(&self, next: &StepStatus) -> bool {
        match (self, next) {
            (s, StepStatus::Failed(_)) => !s.is_terminal(),
            (StepStatus::Idle, StepStatus::AwaitingSignature) => true,
            (StepStatus::AwaitingSignature, StepStatus::Submitted(_)) => true,
            (StepStatus::Submitted(_), StepStatus::Confirmed(_)) => true,
            _ => false,
        }
    }

    /// Aplica la transición o devuelve `InvalidTransition` sin modificar el estado.
    pub fn transition(&mut self, next: StepStatus) -> Result<(), FlowError> {
        if !self.can_transition_to(&next) {
            return Err(FlowError::InvalidTransition { from: self.phase().as_str(),
                                                      to: next.phase().as_str() });
        }
        *self = next;
        Ok(())
    }

    pub fn tx(&self) -> Option<&TxRef> {
        match self {
            StepStatus::Submitted(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            StepStatus::Confirmed(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FlowError> {
        match self {
            StepStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}
