//! Redención de BOLD por colateral a través del registry.

use alloy_primitives::U256;
use async_trait::async_trait;
use tx_core::{ContractCall, FieldSpec, FieldType, FlowCtx, FlowDefinition, FlowError, RequestShape, StepId, TxStep};

use crate::common::{Action, CallStep};

/// Tope de troves recorridos por branch si el request no lo fija.
pub const DEFAULT_MAX_ITERATIONS: u64 = 50;

struct Redeem;

#[async_trait]
impl Action for Redeem {
    fn id(&self) -> StepId {
        StepId::from("redeemCollateral")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Redeem BOLD".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let req = ctx.request;
        let max_iterations = match req.field("maxIterationsPerCollateral") {
            Some(_) => req.uint("maxIterationsPerCollateral")?,
            None => U256::from(DEFAULT_MAX_ITERATIONS),
        };
        Ok(ContractCall::new(ctx.contracts().collateral_registry,
                             "redeemCollateral",
                             vec![req.amount("amount")?.into(),
                                  max_iterations.into(),
                                  req.amount("maxFeePercentage")?.into()]))
    }
}

pub struct RedeemCollateral;

#[async_trait]
impl FlowDefinition for RedeemCollateral {
    fn flow_id(&self) -> &'static str {
        "redeemCollateral"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(FieldSpec::required("amount", FieldType::Dnum).positive())
                                         .field(FieldSpec::required("maxFeePercentage", FieldType::Dnum).positive())
                                         .field(FieldSpec::optional("maxIterationsPerCollateral", FieldType::Uint))
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![Redeem.id()])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "redeemCollateral").then(|| Box::new(CallStep(Redeem)) as Box<dyn TxStep>)
    }
}
