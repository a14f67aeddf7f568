use async_trait::async_trait;
use tx_core::{ContractCall, FlowCtx, FlowError, Receipt, StepId, TxRef, TxStep};

/// Paso que se reduce a construir una llamada y enviarla.
#[async_trait]
pub(crate) trait Action: Send + Sync {
    fn id(&self) -> StepId;
    fn display_name(&self, ctx: &FlowCtx<'_>) -> String;
    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError>;

    async fn verify(&self, _ctx: &FlowCtx<'_>, _receipt: &Receipt) -> Result<(), FlowError> {
        Ok(())
    }
}

pub(crate) struct CallStep<A>(pub A);

#[async_trait]
impl<A: Action> TxStep for CallStep<A> {
    fn id(&self) -> StepId {
        self.0.id()
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        self.0.display_name(ctx)
    }

    async fn submit(&self, ctx: &FlowCtx<'_>) -> Result<TxRef, FlowError> {
        let call = self.0.call(ctx).await?;
        ctx.write(&call).await
    }

    async fn verify(&self, ctx: &FlowCtx<'_>, receipt: &Receipt) -> Result<(), FlowError> {
        self.0.verify(ctx, receipt).await
    }
}
