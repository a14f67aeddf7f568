use async_trait::async_trait;

use crate::codec::RequestShape;
use crate::engine::FlowCtx;
use crate::errors::FlowError;
use crate::step::{StepId, TxStep};

/// Un flujo: forma del request, planificador y tabla de pasos.
#[async_trait]
pub trait FlowDefinition: Send + Sync {
    fn flow_id(&self) -> &'static str;

    fn shape(&self) -> RequestShape;

    /// Lista mínima y ordenada de pasos. Lee estado de cadena a través del
    /// contexto y no envía nada. Un plan vacío se reporta como
    /// `FlowError::NothingToDo`.
    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError>;

    /// Resuelve un id planificado (incluidos los dinámicos `nombre:ítem`).
    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>>;
}
