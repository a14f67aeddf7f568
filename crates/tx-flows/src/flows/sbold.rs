//! Vault sBOLD (ERC-4626 sobre los stability pools).

use async_trait::async_trait;
use tx_core::{ContractCall, FieldSpec, FieldType, FlowCtx, FlowDefinition, FlowError, RequestShape, StepId, TxStep};

use crate::common::{plan_approval, Action, Approval, ApprovalSource, ApproveStep, CallStep};

struct SboldApproval;

#[async_trait]
impl ApprovalSource for SboldApproval {
    fn label(&self, _ctx: &FlowCtx<'_>) -> String {
        "BOLD".into()
    }

    async fn approval(&self, ctx: &FlowCtx<'_>) -> Result<Option<Approval>, FlowError> {
        let contracts = ctx.contracts();
        Ok(Some(Approval { token: contracts.bold_token,
                           spender: contracts.sbold,
                           required: ctx.request.amount("amount")? }))
    }
}

struct DepositSbold;

#[async_trait]
impl Action for DepositSbold {
    fn id(&self) -> StepId {
        StepId::from("depositSbold")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Deposit BOLD into sBOLD".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        Ok(ContractCall::new(ctx.contracts().sbold,
                             "deposit",
                             vec![ctx.request.amount("amount")?.into(), ctx.owner().into()]))
    }
}

pub struct SboldDeposit;

#[async_trait]
impl FlowDefinition for SboldDeposit {
    fn flow_id(&self) -> &'static str {
        "sboldDeposit"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(FieldSpec::required("amount", FieldType::Dnum).positive())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::with_capacity(2);
        plan_approval(ctx, &SboldApproval, "approveBold", &mut plan).await?;
        plan.push(DepositSbold.id());
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "approveBold" => Some(Box::new(ApproveStep { id: "approveBold",
                                                         source: SboldApproval })),
            "depositSbold" => Some(Box::new(CallStep(DepositSbold))),
            _ => None,
        }
    }
}

struct RedeemSbold;

#[async_trait]
impl Action for RedeemSbold {
    fn id(&self) -> StepId {
        StepId::from("redeemSbold")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Redeem sBOLD".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let owner = ctx.owner();
        Ok(ContractCall::new(ctx.contracts().sbold,
                             "redeem",
                             vec![ctx.request.amount("shares")?.into(), owner.into(), owner.into()]))
    }
}

pub struct SboldRedeem;

#[async_trait]
impl FlowDefinition for SboldRedeem {
    fn flow_id(&self) -> &'static str {
        "sboldRedeem"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(FieldSpec::required("shares", FieldType::Dnum).positive())
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![RedeemSbold.id()])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "redeemSbold").then(|| Box::new(CallStep(RedeemSbold)) as Box<dyn TxStep>)
    }
}
