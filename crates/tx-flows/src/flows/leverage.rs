//! Posiciones apalancadas vía el zapper de flash loans.

use async_trait::async_trait;
use tx_core::{CallValue, ContractCall, FieldSpec, FieldType, FlowCtx, FlowDefinition, FlowError, RequestShape,
              StepId, TxStep};

use super::borrow::{CollSpender, CollateralApproval};
use crate::common::{branch, branch_field, max_upfront_fee, plan_approval, trove_field, Action, ApproveStep,
                    CallStep, OpenTroveStep, TroveOpener};

const LEVERAGE_COLL_APPROVAL: CollateralApproval = CollateralApproval { amount_field: "collAmount",
                                                                        increase_flag: None,
                                                                        spender: CollSpender::LeverageZapper };

pub const LEVER_UP: &str = "up";
pub const LEVER_DOWN: &str = "down";

// ---------------------------------------------------------------------------
// openLeveragePosition

pub struct OpenLeveragePosition;

struct LeverageOpener;

impl TroveOpener for LeverageOpener {
    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        match branch(ctx) {
            Ok(b) => format!("Open {} leverage position", b.symbol),
            Err(_) => "Open leverage position".into(),
        }
    }

    fn call(&self, ctx: &FlowCtx<'_>, owner_index: u64) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        let req = ctx.request;
        let coll = req.amount("collAmount")?;
        let args: Vec<CallValue> = vec![ctx.owner().into(),
                                        owner_index.into(),
                                        coll.into(),
                                        req.amount("flashLoanAmount")?.into(),
                                        req.amount("boldAmount")?.into(),
                                        req.amount("annualInterestRate")?.into(),
                                        max_upfront_fee(ctx)?.into()];
        if branch.native {
            return Ok(ContractCall::new(branch.leverage_zapper, "openLeveragedTroveWithRawETH", args).with_value(coll));
        }
        Ok(ContractCall::new(branch.leverage_zapper, "openLeveragedTrove", args))
    }
}

#[async_trait]
impl FlowDefinition for OpenLeveragePosition {
    fn flow_id(&self) -> &'static str {
        "openLeveragePosition"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(FieldSpec::required("ownerIndex", FieldType::Uint))
                                         .field(FieldSpec::required("collAmount", FieldType::Dnum).positive())
                                         .field(FieldSpec::required("flashLoanAmount", FieldType::Dnum).positive())
                                         .field(FieldSpec::required("boldAmount", FieldType::Dnum).positive())
                                         .field(FieldSpec::required("annualInterestRate", FieldType::Dnum))
                                         .field(FieldSpec::optional("maxUpfrontFee", FieldType::Dnum))
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::with_capacity(2);
        plan_approval(ctx, &LEVERAGE_COLL_APPROVAL, "approveCollateral", &mut plan).await?;
        plan.push(StepId::from("openLeveragedTrove"));
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "approveCollateral" => Some(Box::new(ApproveStep { id: "approveCollateral",
                                                               source: LEVERAGE_COLL_APPROVAL })),
            "openLeveragedTrove" => Some(Box::new(OpenTroveStep::new("openLeveragedTrove", LeverageOpener))),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// updateLeveragePosition

pub struct UpdateLeveragePosition;

/// Sube o baja el apalancamiento de un trove existente. Subir toma un flash
/// loan de colateral y acuña BOLD; bajar vende colateral para repagar deuda.
struct Lever {
    up: bool,
}

#[async_trait]
impl Action for Lever {
    fn id(&self) -> StepId {
        StepId::from(if self.up { "leverUp" } else { "leverDown" })
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        let label = if self.up { "Increase leverage" } else { "Decrease leverage" };
        label.into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let branch = branch(ctx)?;
        let req = ctx.request;
        let mut args: Vec<CallValue> = vec![req.uint("troveId")?.into(),
                                            req.amount("flashLoanAmount")?.into(),
                                            req.amount("boldAmount")?.into()];
        if self.up {
            args.push(max_upfront_fee(ctx)?.into());
            return Ok(ContractCall::new(branch.leverage_zapper, "leverUpTrove", args));
        }
        Ok(ContractCall::new(branch.leverage_zapper, "leverDownTrove", args))
    }
}

#[async_trait]
impl FlowDefinition for UpdateLeveragePosition {
    fn flow_id(&self) -> &'static str {
        "updateLeveragePosition"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(branch_field())
                                         .field(trove_field())
                                         .field(FieldSpec::required("direction", FieldType::Enum(&[LEVER_UP, LEVER_DOWN])))
                                         .field(FieldSpec::required("flashLoanAmount", FieldType::Dnum).positive())
                                         // mínimo de BOLD a repagar al bajar, BOLD a acuñar al subir
                                         .field(FieldSpec::required("boldAmount", FieldType::Dnum))
                                         .field(FieldSpec::optional("maxUpfrontFee", FieldType::Dnum))
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let up = ctx.request.choice("direction")? == LEVER_UP;
        Ok(vec![Lever { up }.id()])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "leverUp" => Some(Box::new(CallStep(Lever { up: true }))),
            "leverDown" => Some(Box::new(CallStep(Lever { up: false }))),
            _ => None,
        }
    }
}
