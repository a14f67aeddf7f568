use async_trait::async_trait;

use super::StepId;
use crate::engine::FlowCtx;
use crate::errors::FlowError;
use crate::model::{Receipt, TxRef};

/// Un paso que produce exactamente una transacción.
///
/// Los pasos sólo acceden a estado a través de `FlowCtx` (wallet, índice,
/// estado local); no guardan nada entre `submit` y `verify` salvo lo que
/// ellos mismos encapsulen.
#[async_trait]
pub trait TxStep: Send + Sync {
    fn id(&self) -> StepId;

    /// Nombre legible; puede depender del request.
    fn display_name(&self, ctx: &FlowCtx<'_>) -> String;

    /// Construye la llamada y la envía. Devuelve el hash (directo o del relay).
    async fn submit(&self, ctx: &FlowCtx<'_>) -> Result<TxRef, FlowError>;

    /// Verificación posterior a la confirmación (índice, estado local).
    async fn verify(&self, _ctx: &FlowCtx<'_>, _receipt: &Receipt) -> Result<(), FlowError> {
        Ok(())
    }
}
