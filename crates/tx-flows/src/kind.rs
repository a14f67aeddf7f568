//! Catálogo cerrado de flujos.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tx_core::{FlowCtx, FlowDefinition, FlowError, RequestShape, StepId, TxStep};

use crate::flows::{borrow, earn, governance, leverage, redeem, sbold};

/// Identificador de flujo. El nombre serializado es el `flowId` del request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowKind {
    OpenBorrowPosition,
    UpdateBorrowPosition,
    CloseLoanPosition,
    UpdateLoanInterestRate,
    SetInterestBatchManager,
    ClaimCollateralSurplus,
    ClaimAllCollateralSurplus,
    OpenLeveragePosition,
    UpdateLeveragePosition,
    EarnDeposit,
    EarnWithdraw,
    EarnClaimRewards,
    EarnWithdrawAll,
    EarnClaimAllRewards,
    SboldDeposit,
    SboldRedeem,
    StakeDeposit,
    UnstakeDeposit,
    StakeClaimRewards,
    AllocateVotingPower,
    ResetVotingAllocations,
    RedeemCollateral,
}

impl FlowKind {
    pub const ALL: [FlowKind; 22] = [FlowKind::OpenBorrowPosition,
                                     FlowKind::UpdateBorrowPosition,
                                     FlowKind::CloseLoanPosition,
                                     FlowKind::UpdateLoanInterestRate,
                                     FlowKind::SetInterestBatchManager,
                                     FlowKind::ClaimCollateralSurplus,
                                     FlowKind::ClaimAllCollateralSurplus,
                                     FlowKind::OpenLeveragePosition,
                                     FlowKind::UpdateLeveragePosition,
                                     FlowKind::EarnDeposit,
                                     FlowKind::EarnWithdraw,
                                     FlowKind::EarnClaimRewards,
                                     FlowKind::EarnWithdrawAll,
                                     FlowKind::EarnClaimAllRewards,
                                     FlowKind::SboldDeposit,
                                     FlowKind::SboldRedeem,
                                     FlowKind::StakeDeposit,
                                     FlowKind::UnstakeDeposit,
                                     FlowKind::StakeClaimRewards,
                                     FlowKind::AllocateVotingPower,
                                     FlowKind::ResetVotingAllocations,
                                     FlowKind::RedeemCollateral];

    /// Implementación del flujo.
    pub fn definition(self) -> &'static dyn FlowDefinition {
        match self {
            FlowKind::OpenBorrowPosition => &borrow::OpenBorrowPosition,
            FlowKind::UpdateBorrowPosition => &borrow::UpdateBorrowPosition,
            FlowKind::CloseLoanPosition => &borrow::CloseLoanPosition,
            FlowKind::UpdateLoanInterestRate => &borrow::UpdateLoanInterestRate,
            FlowKind::SetInterestBatchManager => &borrow::SetInterestBatchManager,
            FlowKind::ClaimCollateralSurplus => &borrow::ClaimCollateralSurplus,
            FlowKind::ClaimAllCollateralSurplus => &borrow::ClaimAllCollateralSurplus,
            FlowKind::OpenLeveragePosition => &leverage::OpenLeveragePosition,
            FlowKind::UpdateLeveragePosition => &leverage::UpdateLeveragePosition,
            FlowKind::EarnDeposit => &earn::EarnDeposit,
            FlowKind::EarnWithdraw => &earn::EarnWithdraw,
            FlowKind::EarnClaimRewards => &earn::EarnClaimRewards,
            FlowKind::EarnWithdrawAll => &earn::EarnWithdrawAll,
            FlowKind::EarnClaimAllRewards => &earn::EarnClaimAllRewards,
            FlowKind::SboldDeposit => &sbold::SboldDeposit,
            FlowKind::SboldRedeem => &sbold::SboldRedeem,
            FlowKind::StakeDeposit => &governance::StakeDeposit,
            FlowKind::UnstakeDeposit => &governance::UnstakeDeposit,
            FlowKind::StakeClaimRewards => &governance::StakeClaimRewards,
            FlowKind::AllocateVotingPower => &governance::AllocateVotingPower,
            FlowKind::ResetVotingAllocations => &governance::ResetVotingAllocations,
            FlowKind::RedeemCollateral => &redeem::RedeemCollateral,
        }
    }

    pub fn id(self) -> &'static str {
        self.definition().flow_id()
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FlowKind {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowKind::ALL.into_iter()
                     .find(|k| k.id() == s)
                     .ok_or_else(|| FlowError::UnknownFlow(s.to_string()))
    }
}

#[async_trait]
impl FlowDefinition for FlowKind {
    fn flow_id(&self) -> &'static str {
        self.id()
    }

    fn shape(&self) -> RequestShape {
        self.definition().shape()
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        self.definition().plan(ctx).await
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        self.definition().step(id)
    }
}
