//! Stability pools: depósitos, retiros y reclamo de recompensas.

use alloy_primitives::U256;
use async_trait::async_trait;
use log::debug;
use tx_core::{ContractCall, FieldSpec, FieldType, FlowCtx, FlowDefinition, FlowError, RawTransaction, RequestShape,
              StepId, TxRef, TxStep};
use tx_domain::{BranchContracts, BranchId};

use crate::common::reads::{sp_deposit, sp_has_gains};
use crate::common::{branch, branch_field, parse_branch_item, Action, CallStep};

fn pool_label(ctx: &FlowCtx<'_>, branch: Option<BranchId>) -> String {
    let contracts = match branch {
        Some(id) => ctx.contracts().branch(id).ok(),
        None => self::branch(ctx).ok(),
    };
    contracts.map(|b| format!("{} pool", b.symbol)).unwrap_or_else(|| "stability pool".into())
}

fn resolve<'a>(ctx: &'a FlowCtx<'_>, branch: Option<BranchId>) -> Result<&'a BranchContracts, FlowError> {
    match branch {
        Some(id) => Ok(ctx.contracts().branch(id)?),
        None => self::branch(ctx),
    }
}

/// Llamada de reclamo sin retiro: `withdrawFromSP(0, true)`.
fn claim_call(branch: &BranchContracts) -> ContractCall {
    ContractCall::new(branch.stability_pool, "withdrawFromSP", vec![U256::ZERO.into(), true.into()])
}

// ---------------------------------------------------------------------------
// earnDeposit / earnWithdraw

struct ProvideToSp;

#[async_trait]
impl Action for ProvideToSp {
    fn id(&self) -> StepId {
        StepId::from("provideToSp")
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Deposit into {}", pool_label(ctx, None))
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        Ok(ContractCall::new(branch.stability_pool,
                             "provideToSP",
                             vec![ctx.request.amount("amount")?.into(), ctx.request.flag("claim")?.into()]))
    }
}

pub struct EarnDeposit;

#[async_trait]
impl FlowDefinition for EarnDeposit {
    fn flow_id(&self) -> &'static str {
        "earnDeposit"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(FieldSpec::required("amount", FieldType::Dnum).positive())
                                         .field(FieldSpec::optional("claim", FieldType::Bool))
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![ProvideToSp.id()])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "provideToSp").then(|| Box::new(CallStep(ProvideToSp)) as Box<dyn TxStep>)
    }
}

/// Retiro de un pool. Con branch fijo (retiro total) el monto es el depósito
/// vigente al momento de firmar.
struct WithdrawFromSp {
    branch: Option<BranchId>,
}

#[async_trait]
impl Action for WithdrawFromSp {
    fn id(&self) -> StepId {
        match self.branch {
            Some(id) => StepId::indexed("withdrawFromSp", id),
            None => StepId::from("withdrawFromSp"),
        }
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Withdraw from {}", pool_label(ctx, self.branch))
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = resolve(ctx, self.branch)?;
        let (amount, claim) = match self.branch {
            Some(_) => (sp_deposit(ctx, branch).await?, true),
            None => (ctx.request.amount("amount")?, ctx.request.flag("claim")?),
        };
        Ok(ContractCall::new(branch.stability_pool, "withdrawFromSP", vec![amount.into(), claim.into()]))
    }
}

pub struct EarnWithdraw;

#[async_trait]
impl FlowDefinition for EarnWithdraw {
    fn flow_id(&self) -> &'static str {
        "earnWithdraw"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(FieldSpec::required("amount", FieldType::Dnum).positive())
                                         .field(FieldSpec::optional("claim", FieldType::Bool))
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![StepId::from("withdrawFromSp")])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "withdrawFromSp").then(|| {
                                             Box::new(CallStep(WithdrawFromSp { branch: None })) as Box<dyn TxStep>
                                         })
    }
}

// ---------------------------------------------------------------------------
// earnClaimRewards

struct ClaimRewards {
    branch: Option<BranchId>,
}

#[async_trait]
impl Action for ClaimRewards {
    fn id(&self) -> StepId {
        match self.branch {
            Some(id) => StepId::indexed("claimRewards", id),
            None => StepId::from("claimRewards"),
        }
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Claim rewards from {}", pool_label(ctx, self.branch))
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        Ok(claim_call(resolve(ctx, self.branch)?))
    }
}

pub struct EarnClaimRewards;

#[async_trait]
impl FlowDefinition for EarnClaimRewards {
    fn flow_id(&self) -> &'static str {
        "earnClaimRewards"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        if !sp_has_gains(ctx, branch(ctx)?).await? {
            return Ok(vec![]);
        }
        Ok(vec![StepId::from("claimRewards")])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "claimRewards").then(|| Box::new(CallStep(ClaimRewards { branch: None })) as Box<dyn TxStep>)
    }
}

// ---------------------------------------------------------------------------
// earnWithdrawAll

pub struct EarnWithdrawAll;

#[async_trait]
impl FlowDefinition for EarnWithdrawAll {
    fn flow_id(&self) -> &'static str {
        "earnWithdrawAll"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::new();
        for branch in &ctx.contracts().branches {
            if !sp_deposit(ctx, branch).await?.is_zero() {
                plan.push(StepId::indexed("withdrawFromSp", branch.id));
            }
        }
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        let branch = parse_branch_item(id, "withdrawFromSp")?;
        Some(Box::new(CallStep(WithdrawFromSp { branch: Some(branch) })))
    }
}

// ---------------------------------------------------------------------------
// earnClaimAllRewards

pub const CLAIM_ALL_BATCHED: &str = "claimAllBatched";

/// Branches con recompensas pendientes, en el orden del despliegue.
async fn branches_with_gains<'a>(ctx: &'a FlowCtx<'_>) -> Result<Vec<&'a BranchContracts>, FlowError> {
    let mut out = Vec::new();
    for branch in &ctx.contracts().branches {
        if sp_has_gains(ctx, branch).await? {
            out.push(branch);
        }
    }
    Ok(out)
}

/// Un solo multisend con un reclamo por pool; para cuentas multisig evita
/// juntar firmas una vez por branch.
struct ClaimAllBatched;

#[async_trait]
impl TxStep for ClaimAllBatched {
    fn id(&self) -> StepId {
        StepId::from(CLAIM_ALL_BATCHED)
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Claim rewards from all pools".into()
    }

    async fn submit(&self, ctx: &FlowCtx<'_>) -> Result<TxRef, FlowError> {
        let calls: Vec<ContractCall> = branches_with_gains(ctx).await?.into_iter().map(claim_call).collect();
        if calls.is_empty() {
            return Err(FlowError::NothingToDo);
        }
        debug!("claimAllBatched calls={}", calls.len());
        ctx.send_raw(&RawTransaction::multisend(ctx.contracts().multisend, calls)).await
    }
}

pub struct EarnClaimAllRewards;

#[async_trait]
impl FlowDefinition for EarnClaimAllRewards {
    fn flow_id(&self) -> &'static str {
        "earnClaimAllRewards"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let branches = branches_with_gains(ctx).await?;
        if branches.is_empty() {
            return Ok(vec![]);
        }
        if ctx.is_relayed() {
            return Ok(vec![StepId::from(CLAIM_ALL_BATCHED)]);
        }
        Ok(branches.iter().map(|b| StepId::indexed("claimRewards", b.id)).collect())
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        if id.as_str() == CLAIM_ALL_BATCHED {
            return Some(Box::new(ClaimAllBatched));
        }
        let branch = parse_branch_item(id, "claimRewards")?;
        Some(Box::new(CallStep(ClaimRewards { branch: Some(branch) })))
    }
}
