use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tx_core::{ContractCall, FlowCtx, FlowError, StepId, TxRef, TxStep};
use tx_domain::ApprovalPolicy;

use super::reads::allowance;

/// Gasto de un token que requiere allowance previa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Approval {
    pub token: Address,
    pub spender: Address,
    pub required: U256,
}

impl Approval {
    pub async fn is_needed(&self, ctx: &FlowCtx<'_>) -> Result<bool, FlowError> {
        if self.required.is_zero() {
            return Ok(false);
        }
        Ok(allowance(ctx, self.token, self.spender).await? < self.required)
    }

    pub fn call(&self, policy: ApprovalPolicy) -> ContractCall {
        ContractCall::new(self.token,
                          "approve",
                          vec![self.spender.into(), policy.amount_for(self.required).into()])
    }
}

/// Determina qué aprobación necesita un flujo. `None` cuando el cambio no
/// gasta tokens (disminuciones, colateral nativo).
#[async_trait]
pub(crate) trait ApprovalSource: Send + Sync {
    fn label(&self, ctx: &FlowCtx<'_>) -> String;
    async fn approval(&self, ctx: &FlowCtx<'_>) -> Result<Option<Approval>, FlowError>;
}

pub(crate) struct ApproveStep<S> {
    pub id: &'static str,
    pub source: S,
}

#[async_trait]
impl<S: ApprovalSource> TxStep for ApproveStep<S> {
    fn id(&self) -> StepId {
        StepId::from(self.id)
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Approve {}", self.source.label(ctx))
    }

    async fn submit(&self, ctx: &FlowCtx<'_>) -> Result<TxRef, FlowError> {
        let approval = self.source
                           .approval(ctx)
                           .await?
                           .ok_or_else(|| FlowError::Internal(format!("`{}` has nothing to approve", self.id)))?;
        ctx.write(&approval.call(ctx.approval_policy())).await
    }
}

/// Agrega `approve_id` al plan si la aprobación hace falta.
pub(crate) async fn plan_approval<S: ApprovalSource>(ctx: &FlowCtx<'_>, source: &S, approve_id: &'static str,
                                                     plan: &mut Vec<StepId>)
                                                     -> Result<(), FlowError> {
    if let Some(approval) = source.approval(ctx).await? {
        if approval.is_needed(ctx).await? {
            plan.push(StepId::from(approve_id));
        }
    }
    Ok(())
}
