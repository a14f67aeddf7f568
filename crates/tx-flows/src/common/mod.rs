//! Piezas compartidas por los flujos: lecturas de cadena, pasos de
//! aprobación y pasos de una sola llamada.

mod approve;
mod call;
mod open_trove;
pub(crate) mod reads;

pub(crate) use approve::{plan_approval, Approval, ApprovalSource, ApproveStep};
pub(crate) use call::{Action, CallStep};
pub(crate) use open_trove::{max_upfront_fee, OpenTroveStep, TroveOpener};

use alloy_primitives::U256;
use tx_core::{FieldSpec, FieldType, FlowCtx, FlowError, StepId};
use tx_domain::{BranchContracts, BranchId};

pub(crate) fn branch_field() -> FieldSpec {
    FieldSpec::required("branchId", FieldType::Uint)
}

pub(crate) fn trove_field() -> FieldSpec {
    FieldSpec::required("troveId", FieldType::Uint)
}

/// Contratos del branch indicado en el campo `branchId`.
pub(crate) fn branch<'a>(ctx: &'a FlowCtx<'_>) -> Result<&'a BranchContracts, FlowError> {
    let id = ctx.request.branch("branchId")?;
    Ok(ctx.contracts().branch(id)?)
}

/// Monto opcional; ausente equivale a cero.
pub(crate) fn amount_or_zero(ctx: &FlowCtx<'_>, name: &str) -> Result<U256, FlowError> {
    Ok(ctx.request.opt_amount(name)?.unwrap_or(U256::ZERO))
}

/// `nombre:<branch>` → branch, si el nombre coincide.
pub(crate) fn parse_branch_item(id: &StepId, name: &str) -> Option<BranchId> {
    if id.name() != name {
        return None;
    }
    id.item()?.parse::<u8>().ok().map(BranchId::new)
}
