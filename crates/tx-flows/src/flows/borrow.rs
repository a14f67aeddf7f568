//! Préstamos: apertura, ajuste, cierre y mantenimiento de troves.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tx_core::{CallValue, ContractCall, FieldSpec, FieldType, FlowCtx, FlowDefinition, FlowError, RequestShape,
              StepId, TxStep};
use tx_domain::{BranchContracts, BranchId, TroveId};

use crate::common::reads::{coll_surplus, trove_debt};
use crate::common::{amount_or_zero, branch, branch_field, max_upfront_fee, parse_branch_item, plan_approval,
                    trove_field, Action, Approval, ApprovalSource, ApproveStep, CallStep, OpenTroveStep,
                    TroveOpener};

const NO_HINT: U256 = U256::ZERO;

fn trove_id(ctx: &FlowCtx<'_>) -> Result<TroveId, FlowError> {
    Ok(TroveId(ctx.request.uint("troveId")?))
}

fn symbol(ctx: &FlowCtx<'_>) -> String {
    branch(ctx).map(|b| b.symbol.clone()).unwrap_or_else(|_| "collateral".into())
}

/// Quién toma el colateral al aprobar.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CollSpender {
    BorrowerOperations,
    LeverageZapper,
}

/// Aprobación del token de colateral. Los branches nativos no la necesitan
/// (el colateral viaja como `value`).
pub(crate) struct CollateralApproval {
    pub amount_field: &'static str,
    /// Si está presente, sólo se aprueba cuando el flag es verdadero.
    pub increase_flag: Option<&'static str>,
    pub spender: CollSpender,
}

#[async_trait]
impl ApprovalSource for CollateralApproval {
    fn label(&self, ctx: &FlowCtx<'_>) -> String {
        symbol(ctx)
    }

    async fn approval(&self, ctx: &FlowCtx<'_>) -> Result<Option<Approval>, FlowError> {
        let branch = branch(ctx)?;
        if branch.native {
            return Ok(None);
        }
        if let Some(flag) = self.increase_flag {
            if !ctx.request.flag(flag)? {
                return Ok(None);
            }
        }
        let spender = match self.spender {
            CollSpender::BorrowerOperations => branch.borrower_operations,
            CollSpender::LeverageZapper => branch.leverage_zapper,
        };
        Ok(Some(Approval { token: branch.coll_token,
                           spender,
                           required: amount_or_zero(ctx, self.amount_field)? }))
    }
}

// ---------------------------------------------------------------------------
// openBorrowPosition

pub struct OpenBorrowPosition;

const OPEN_COLL_APPROVAL: CollateralApproval = CollateralApproval { amount_field: "collAmount",
                                                                    increase_flag: None,
                                                                    spender: CollSpender::BorrowerOperations };

struct BorrowOpener;

impl TroveOpener for BorrowOpener {
    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Open {} loan", symbol(ctx))
    }

    fn call(&self, ctx: &FlowCtx<'_>, owner_index: u64) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        let req = ctx.request;
        let coll = req.amount("collAmount")?;
        let mut args: Vec<CallValue> = vec![ctx.owner().into(),
                                            owner_index.into(),
                                            req.amount("boldAmount")?.into(),
                                            NO_HINT.into(),
                                            NO_HINT.into()];
        let batch = req.opt_address("interestBatchManager")?;
        match batch {
            Some(manager) => args.push(manager.into()),
            None => args.push(req.amount("annualInterestRate")?.into()),
        }
        args.push(max_upfront_fee(ctx)?.into());
        let call = match (branch.native, batch.is_some()) {
            (true, false) => ContractCall::new(branch.zapper, "openTroveWithRawETH", args).with_value(coll),
            (true, true) => ContractCall::new(branch.zapper, "openTroveAndJoinBatchWithRawETH", args).with_value(coll),
            (false, joins) => {
                // BorrowerOperations recibe el colateral como argumento explícito
                args.insert(2, coll.into());
                let function = if joins { "openTroveAndJoinInterestBatchManager" } else { "openTrove" };
                ContractCall::new(branch.borrower_operations, function, args)
            }
        };
        Ok(call)
    }
}

#[async_trait]
impl FlowDefinition for OpenBorrowPosition {
    fn flow_id(&self) -> &'static str {
        "openBorrowPosition"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(FieldSpec::required("ownerIndex", FieldType::Uint))
                                         .field(FieldSpec::required("collAmount", FieldType::Dnum).positive())
                                         .field(FieldSpec::required("boldAmount", FieldType::Dnum).positive())
                                         .field(FieldSpec::required("annualInterestRate", FieldType::Dnum))
                                         .field(FieldSpec::optional("maxUpfrontFee", FieldType::Dnum))
                                         .field(FieldSpec::optional("interestBatchManager", FieldType::Address))
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::with_capacity(2);
        plan_approval(ctx, &OPEN_COLL_APPROVAL, "approveCollateral", &mut plan).await?;
        plan.push(StepId::from("openTrove"));
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "approveCollateral" => Some(Box::new(ApproveStep { id: "approveCollateral",
                                                               source: OPEN_COLL_APPROVAL })),
            "openTrove" => Some(Box::new(OpenTroveStep::new("openTrove", BorrowOpener))),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// updateBorrowPosition

pub struct UpdateBorrowPosition;

const ADJUST_COLL_APPROVAL: CollateralApproval = CollateralApproval { amount_field: "collChange",
                                                                      increase_flag: Some("isCollIncrease"),
                                                                      spender: CollSpender::BorrowerOperations };

/// Repago de deuda en branches nativos: el zapper retira el BOLD con
/// `transferFrom`.
struct RepayBoldApproval;

#[async_trait]
impl ApprovalSource for RepayBoldApproval {
    fn label(&self, _ctx: &FlowCtx<'_>) -> String {
        "BOLD".into()
    }

    async fn approval(&self, ctx: &FlowCtx<'_>) -> Result<Option<Approval>, FlowError> {
        let branch = branch(ctx)?;
        if !branch.native || ctx.request.flag("isDebtIncrease")? {
            return Ok(None);
        }
        Ok(Some(Approval { token: ctx.contracts().bold_token,
                           spender: branch.zapper,
                           required: amount_or_zero(ctx, "debtChange")? }))
    }
}

struct AdjustTrove;

#[async_trait]
impl Action for AdjustTrove {
    fn id(&self) -> StepId {
        StepId::from("adjustTrove")
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Update {} loan", symbol(ctx))
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        let req = ctx.request;
        let coll = amount_or_zero(ctx, "collChange")?;
        let coll_increase = req.flag("isCollIncrease")?;
        let args: Vec<CallValue> = vec![trove_id(ctx)?.0.into(),
                                        coll.into(),
                                        coll_increase.into(),
                                        amount_or_zero(ctx, "debtChange")?.into(),
                                        req.flag("isDebtIncrease")?.into(),
                                        max_upfront_fee(ctx)?.into()];
        if branch.native {
            let value = if coll_increase { coll } else { U256::ZERO };
            return Ok(ContractCall::new(branch.zapper, "adjustTroveWithRawETH", args).with_value(value));
        }
        Ok(ContractCall::new(branch.borrower_operations, "adjustTrove", args))
    }
}

#[async_trait]
impl FlowDefinition for UpdateBorrowPosition {
    fn flow_id(&self) -> &'static str {
        "updateBorrowPosition"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(trove_field())
                                         .field(FieldSpec::optional("collChange", FieldType::Dnum))
                                         .field(FieldSpec::optional("isCollIncrease", FieldType::Bool))
                                         .field(FieldSpec::optional("debtChange", FieldType::Dnum))
                                         .field(FieldSpec::optional("isDebtIncrease", FieldType::Bool))
                                         .field(FieldSpec::optional("maxUpfrontFee", FieldType::Dnum))
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        if amount_or_zero(ctx, "collChange")?.is_zero() && amount_or_zero(ctx, "debtChange")?.is_zero() {
            return Ok(vec![]);
        }
        let mut plan = Vec::with_capacity(3);
        plan_approval(ctx, &ADJUST_COLL_APPROVAL, "approveCollateral", &mut plan).await?;
        plan_approval(ctx, &RepayBoldApproval, "approveBold", &mut plan).await?;
        plan.push(StepId::from("adjustTrove"));
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "approveCollateral" => Some(Box::new(ApproveStep { id: "approveCollateral",
                                                               source: ADJUST_COLL_APPROVAL })),
            "approveBold" => Some(Box::new(ApproveStep { id: "approveBold",
                                                         source: RepayBoldApproval })),
            "adjustTrove" => Some(Box::new(CallStep(AdjustTrove))),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// closeLoanPosition

pub struct CloseLoanPosition;

/// Cierre en branch nativo: el zapper necesita la deuda completa en BOLD.
struct CloseBoldApproval;

#[async_trait]
impl ApprovalSource for CloseBoldApproval {
    fn label(&self, _ctx: &FlowCtx<'_>) -> String {
        "BOLD".into()
    }

    async fn approval(&self, ctx: &FlowCtx<'_>) -> Result<Option<Approval>, FlowError> {
        let branch = branch(ctx)?;
        if !branch.native {
            return Ok(None);
        }
        let debt = trove_debt(ctx, branch, trove_id(ctx)?).await?;
        Ok(Some(Approval { token: ctx.contracts().bold_token,
                           spender: branch.zapper,
                           required: debt }))
    }
}

struct CloseTrove;

#[async_trait]
impl Action for CloseTrove {
    fn id(&self) -> StepId {
        StepId::from("closeTrove")
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        format!("Close {} loan", symbol(ctx))
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        let trove = trove_id(ctx)?.0;
        if branch.native {
            return Ok(ContractCall::new(branch.zapper, "closeTroveToRawETH", vec![trove.into()]));
        }
        Ok(ContractCall::new(branch.borrower_operations, "closeTrove", vec![trove.into()]))
    }
}

#[async_trait]
impl FlowDefinition for CloseLoanPosition {
    fn flow_id(&self) -> &'static str {
        "closeLoanPosition"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field()).field(trove_field())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::with_capacity(2);
        plan_approval(ctx, &CloseBoldApproval, "approveBold", &mut plan).await?;
        plan.push(StepId::from("closeTrove"));
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "approveBold" => Some(Box::new(ApproveStep { id: "approveBold",
                                                         source: CloseBoldApproval })),
            "closeTrove" => Some(Box::new(CallStep(CloseTrove))),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// updateLoanInterestRate

pub struct UpdateLoanInterestRate;

struct AdjustInterestRate;

#[async_trait]
impl Action for AdjustInterestRate {
    fn id(&self) -> StepId {
        StepId::from("adjustInterestRate")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Update interest rate".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        Ok(ContractCall::new(branch.borrower_operations,
                             "adjustTroveInterestRate",
                             vec![trove_id(ctx)?.0.into(),
                                  ctx.request.amount("annualInterestRate")?.into(),
                                  NO_HINT.into(),
                                  NO_HINT.into(),
                                  max_upfront_fee(ctx)?.into()]))
    }
}

#[async_trait]
impl FlowDefinition for UpdateLoanInterestRate {
    fn flow_id(&self) -> &'static str {
        "updateLoanInterestRate"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(trove_field())
                                         .field(FieldSpec::required("annualInterestRate", FieldType::Dnum).positive())
                                         .field(FieldSpec::optional("maxUpfrontFee", FieldType::Dnum))
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![StepId::from("adjustInterestRate")])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "adjustInterestRate").then(|| Box::new(CallStep(AdjustInterestRate)) as Box<dyn TxStep>)
    }
}

// ---------------------------------------------------------------------------
// setInterestBatchManager

pub struct SetInterestBatchManager;

struct SetBatchManager;

#[async_trait]
impl Action for SetBatchManager {
    fn id(&self) -> StepId {
        StepId::from("setInterestBatchManager")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Delegate interest rate".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        let manager: Address = ctx.request.address("batchManager")?;
        Ok(ContractCall::new(branch.borrower_operations,
                             "setInterestBatchManager",
                             vec![trove_id(ctx)?.0.into(),
                                  manager.into(),
                                  NO_HINT.into(),
                                  NO_HINT.into(),
                                  max_upfront_fee(ctx)?.into()]))
    }
}

#[async_trait]
impl FlowDefinition for SetInterestBatchManager {
    fn flow_id(&self) -> &'static str {
        "setInterestBatchManager"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(trove_field())
                                         .field(FieldSpec::required("batchManager", FieldType::Address))
                                         .field(FieldSpec::optional("maxUpfrontFee", FieldType::Dnum))
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![StepId::from("setInterestBatchManager")])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "setInterestBatchManager").then(|| Box::new(CallStep(SetBatchManager)) as Box<dyn TxStep>)
    }
}

// ---------------------------------------------------------------------------
// claimCollateralSurplus / claimAllCollateralSurplus

/// Reclama el excedente de colateral tras una liquidación o redención.
struct ClaimSurplus {
    branch: Option<BranchId>,
}

impl ClaimSurplus {
    fn branch<'a>(&self, ctx: &'a FlowCtx<'_>) -> Result<&'a BranchContracts, FlowError> {
        match self.branch {
            Some(id) => Ok(ctx.contracts().branch(id)?),
            None => branch(ctx),
        }
    }
}

#[async_trait]
impl Action for ClaimSurplus {
    fn id(&self) -> StepId {
        match self.branch {
            Some(id) => StepId::indexed("claimCollateral", id),
            None => StepId::from("claimCollateral"),
        }
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        match self.branch(ctx) {
            Ok(b) => format!("Claim {} surplus", b.symbol),
            Err(_) => "Claim collateral surplus".into(),
        }
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = self.branch(ctx)?;
        Ok(ContractCall::new(branch.borrower_operations, "claimCollateral", vec![]))
    }
}

pub struct ClaimCollateralSurplus;

#[async_trait]
impl FlowDefinition for ClaimCollateralSurplus {
    fn flow_id(&self) -> &'static str {
        "claimCollateralSurplus"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let surplus = coll_surplus(ctx, branch(ctx)?).await?;
        Ok(if surplus.is_zero() { vec![] } else { vec![StepId::from("claimCollateral")] })
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "claimCollateral").then(|| Box::new(CallStep(ClaimSurplus { branch: None })) as Box<dyn TxStep>)
    }
}

pub struct ClaimAllCollateralSurplus;

#[async_trait]
impl FlowDefinition for ClaimAllCollateralSurplus {
    fn flow_id(&self) -> &'static str {
        "claimAllCollateralSurplus"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::new();
        for branch in &ctx.contracts().branches {
            if !coll_surplus(ctx, branch).await?.is_zero() {
                plan.push(StepId::indexed("claimCollateral", branch.id));
            }
        }
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        let branch = parse_branch_item(id, "claimCollateral")?;
        Some(Box::new(CallStep(ClaimSurplus { branch: Some(branch) })))
    }
}
