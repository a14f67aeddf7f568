//! Lecturas de estado de cadena usadas por planificadores y pasos.

use alloy_primitives::{Address, U256};
use tx_core::{CallValue, ContractCall, FlowCtx, FlowError};
use tx_domain::{BranchContracts, TroveId};

pub(crate) async fn allowance(ctx: &FlowCtx<'_>, token: Address, spender: Address) -> Result<U256, FlowError> {
    ctx.read(&ContractCall::new(token, "allowance", vec![ctx.owner().into(), spender.into()]))
       .await?
       .as_uint()
}

pub(crate) async fn balance_of(ctx: &FlowCtx<'_>, token: Address) -> Result<U256, FlowError> {
    ctx.read(&ContractCall::new(token, "balanceOf", vec![ctx.owner().into()]))
       .await?
       .as_uint()
}

pub(crate) async fn sp_deposit(ctx: &FlowCtx<'_>, branch: &BranchContracts) -> Result<U256, FlowError> {
    ctx.read(&ContractCall::new(branch.stability_pool, "getCompoundedBoldDeposit", vec![ctx.owner().into()]))
       .await?
       .as_uint()
}

/// Hay rendimiento en BOLD o ganancia de colateral por reclamar.
pub(crate) async fn sp_has_gains(ctx: &FlowCtx<'_>, branch: &BranchContracts) -> Result<bool, FlowError> {
    let owner: CallValue = ctx.owner().into();
    let yield_gain = ctx.read(&ContractCall::new(branch.stability_pool, "getDepositorYieldGain", vec![owner.clone()]))
                        .await?
                        .as_uint()?;
    if !yield_gain.is_zero() {
        return Ok(true);
    }
    let coll_gain = ctx.read(&ContractCall::new(branch.stability_pool, "getDepositorCollGain", vec![owner]))
                       .await?
                       .as_uint()?;
    Ok(!coll_gain.is_zero())
}

pub(crate) async fn coll_surplus(ctx: &FlowCtx<'_>, branch: &BranchContracts) -> Result<U256, FlowError> {
    ctx.read(&ContractCall::new(branch.coll_surplus_pool, "getCollateral", vec![ctx.owner().into()]))
       .await?
       .as_uint()
}

/// Deuda total actual de un trove (`entireDebt`, primer campo de
/// `getLatestTroveData`).
pub(crate) async fn trove_debt(ctx: &FlowCtx<'_>, branch: &BranchContracts, trove: TroveId)
                               -> Result<U256, FlowError> {
    ctx.read(&ContractCall::new(branch.trove_manager, "getLatestTroveData", vec![trove.0.into()]))
       .await?
       .at(0)?
       .as_uint()
}

/// Estado de gobernanza de la cuenta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UserState {
    pub unallocated: U256,
    pub allocated: U256,
}

impl UserState {
    pub fn staked(&self) -> U256 {
        self.unallocated.saturating_add(self.allocated)
    }
}

/// `userStates(owner)` devuelve
/// `(unallocatedLQTY, unallocatedOffset, allocatedLQTY, allocatedOffset)`.
pub(crate) async fn user_state(ctx: &FlowCtx<'_>) -> Result<UserState, FlowError> {
    let governance = ctx.contracts().governance;
    let state = ctx.read(&ContractCall::new(governance, "userStates", vec![ctx.owner().into()]))
                   .await?;
    Ok(UserState { unallocated: state.at(0)?.as_uint()?,
                   allocated: state.at(2)?.as_uint()? })
}

/// Proxy de staking de la cuenta; es quien mueve el LQTY.
pub(crate) async fn user_proxy(ctx: &FlowCtx<'_>) -> Result<Address, FlowError> {
    let governance = ctx.contracts().governance;
    ctx.read(&ContractCall::new(governance, "deriveUserProxyAddress", vec![ctx.owner().into()]))
       .await?
       .as_address()
}
