use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::errors::FlowError;
use crate::model::FlowRequest;
use crate::step::{StepId, StepStatus};

/// Estado de un run. Lo posee el executor mientras dura `run` y se devuelve
/// al llamador al terminar; no se persiste.
#[derive(Debug, Clone)]
pub struct FlowRun {
    pub id: Uuid,
    pub request: Arc<FlowRequest>,
    pub planned_steps: Vec<StepId>,
    pub current_index: usize,
    pub statuses: IndexMap<StepId, StepStatus>,
}

impl FlowRun {
    pub fn new(id: Uuid, request: Arc<FlowRequest>) -> Self {
        Self { id,
               request,
               planned_steps: Vec::new(),
               current_index: 0,
               statuses: IndexMap::new() }
    }

    /// Fija el plan con todos los pasos en `Idle`. Ids repetidos no se aceptan.
    pub fn set_plan(&mut self, steps: Vec<StepId>) -> Result<(), FlowError> {
        let mut statuses = IndexMap::with_capacity(steps.len());
        for id in &steps {
            if statuses.insert(id.clone(), StepStatus::Idle).is_some() {
                return Err(FlowError::Internal(format!("step `{id}` planned twice")));
            }
        }
        self.planned_steps = steps;
        self.statuses = statuses;
        self.current_index = 0;
        Ok(())
    }

    pub fn status(&self, id: &StepId) -> Option<&StepStatus> {
        self.statuses.get(id)
    }

    pub fn transition(&mut self, id: &StepId, next: StepStatus) -> Result<(), FlowError> {
        self.statuses
            .get_mut(id)
            .ok_or_else(|| FlowError::UnknownStep(id.to_string()))?
            .transition(next)
    }

    pub fn is_completed(&self) -> bool {
        !self.statuses.is_empty() && self.statuses.values().all(|s| matches!(s, StepStatus::Confirmed(_)))
    }

    pub fn failed_step(&self) -> Option<(&StepId, &FlowError)> {
        self.statuses.iter().find_map(|(id, s)| s.error().map(|e| (id, e)))
    }
}
