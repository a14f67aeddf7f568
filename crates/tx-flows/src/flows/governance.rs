//! Staking de LQTY y votos de gobernanza.
//!
//! El LQTY vive en un proxy por usuario; la gobernanza lleva por cuenta un
//! saldo asignado (votos a iniciativas) y uno libre. Sólo el libre se puede
//! retirar sin tocar los votos.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use log::{info, warn};
use tx_core::{CallValue, ContractCall, FieldSpec, FieldType, FieldValue, FlowCtx, FlowDefinition, FlowError,
              RequestShape, StepId, TxRef, TxStep};
use tx_domain::{DomainError, VoteAllocation, VoteDirection};
use tx_policies::reallocate;

use crate::common::reads::{user_proxy, user_state};
use crate::common::{plan_approval, Action, Approval, ApprovalSource, ApproveStep, CallStep};

pub const VOTE_FOR: &str = "for";
pub const VOTE_AGAINST: &str = "against";

fn governance_call(ctx: &FlowCtx<'_>, function: &str, args: Vec<CallValue>) -> ContractCall {
    ContractCall::new(ctx.contracts().governance, function, args)
}

fn withdraw_call(ctx: &FlowCtx<'_>, amount: U256) -> ContractCall {
    governance_call(ctx, "withdrawLQTY", vec![amount.into()])
}

fn reset_call(ctx: &FlowCtx<'_>, initiatives: Vec<Address>) -> ContractCall {
    governance_call(ctx, "resetAllocations", vec![CallValue::addresses(initiatives), true.into()])
}

/// `allocateLQTY(initiativesToReset, initiatives, votes, vetos)`.
fn allocate_call(ctx: &FlowCtx<'_>, allocations: &[(Address, U256, VoteDirection)]) -> ContractCall {
    let initiatives = allocations.iter().map(|(a, _, _)| *a);
    let votes = allocations.iter()
                           .map(|(_, amount, dir)| if *dir == VoteDirection::For { *amount } else { U256::ZERO });
    let vetos = allocations.iter()
                           .map(|(_, amount, dir)| if *dir == VoteDirection::Against { *amount } else { U256::ZERO });
    governance_call(ctx,
                    "allocateLQTY",
                    vec![CallValue::List(vec![]),
                         CallValue::addresses(initiatives),
                         CallValue::uints(votes),
                         CallValue::uints(vetos)])
}

/// Iniciativas con votos de la cuenta, según el índice.
async fn allocated_initiatives(ctx: &FlowCtx<'_>) -> Result<Vec<VoteAllocation>, FlowError> {
    Ok(ctx.account.ports.index.vote_allocations(ctx.owner()).await?)
}

// ---------------------------------------------------------------------------
// stakeDeposit

struct LqtyApproval;

#[async_trait]
impl ApprovalSource for LqtyApproval {
    fn label(&self, _ctx: &FlowCtx<'_>) -> String {
        "LQTY".into()
    }

    async fn approval(&self, ctx: &FlowCtx<'_>) -> Result<Option<Approval>, FlowError> {
        Ok(Some(Approval { token: ctx.contracts().lqty_token,
                           spender: user_proxy(ctx).await?,
                           required: ctx.request.amount("amount")? }))
    }
}

struct DepositLqty;

#[async_trait]
impl Action for DepositLqty {
    fn id(&self) -> StepId {
        StepId::from("depositLqty")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Stake LQTY".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        Ok(governance_call(ctx, "depositLQTY", vec![ctx.request.amount("amount")?.into()]))
    }
}

pub struct StakeDeposit;

#[async_trait]
impl FlowDefinition for StakeDeposit {
    fn flow_id(&self) -> &'static str {
        "stakeDeposit"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(FieldSpec::required("amount", FieldType::Dnum).positive())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let mut plan = Vec::with_capacity(2);
        plan_approval(ctx, &LqtyApproval, "approveLqty", &mut plan).await?;
        plan.push(DepositLqty.id());
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "approveLqty" => Some(Box::new(ApproveStep { id: "approveLqty",
                                                         source: LqtyApproval })),
            "depositLqty" => Some(Box::new(CallStep(DepositLqty))),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// unstakeDeposit

fn degraded(cause: &str) -> FlowError {
    FlowError::DegradedRead(format!("{cause}; reset allocations manually before unstaking"))
}

/// Retiro de LQTY. Si el saldo libre no alcanza, resetea los votos, retira y
/// vuelve a repartir lo que queda en proporción a los votos previos, todo en
/// un único `multiDelegateCall`.
struct Unstake;

impl Unstake {
    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let amount = ctx.request.amount("amount")?;
        let state = user_state(ctx).await?;
        let staked = state.staked();
        if amount > staked {
            return Err(DomainError::Validation(format!("cannot unstake {amount}, only {staked} staked")).into());
        }
        if amount <= state.unallocated {
            return Ok(withdraw_call(ctx, amount));
        }

        let allocations = match allocated_initiatives(ctx).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => return Err(degraded("vote allocations not indexed yet")),
            Err(e) => {
                warn!("unstake: cannot enumerate vote allocations: {}", e);
                return Err(degraded(&e.to_string()));
            }
        };

        let remaining = staked - amount;
        let reallocation = reallocate(&allocations, remaining)?;
        info!("unstake amount={} remaining={} recipients={}", amount, remaining, reallocation.len());

        let mut reset: Vec<Address> = Vec::with_capacity(allocations.len());
        for a in &allocations {
            if !reset.contains(&a.recipient) {
                reset.push(a.recipient);
            }
        }
        let targets: Vec<(Address, U256, VoteDirection)> =
            reallocation.iter().map(|(addr, r)| (*addr, r.amount, r.direction)).collect();
        let mut batch = vec![reset_call(ctx, reset), withdraw_call(ctx, amount)];
        if !remaining.is_zero() {
            batch.push(allocate_call(ctx, &targets));
        }
        Ok(governance_call(ctx,
                           "multiDelegateCall",
                           vec![CallValue::List(batch.into_iter().map(CallValue::from).collect())]))
    }
}

#[async_trait]
impl TxStep for Unstake {
    fn id(&self) -> StepId {
        StepId::from("unstake")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Unstake LQTY".into()
    }

    async fn submit(&self, ctx: &FlowCtx<'_>) -> Result<TxRef, FlowError> {
        let call = self.call(ctx).await?;
        ctx.write(&call).await
    }
}

pub struct UnstakeDeposit;

#[async_trait]
impl FlowDefinition for UnstakeDeposit {
    fn flow_id(&self) -> &'static str {
        "unstakeDeposit"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id()).field(FieldSpec::required("amount", FieldType::Dnum).positive())
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![StepId::from("unstake")])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "unstake").then(|| Box::new(Unstake) as Box<dyn TxStep>)
    }
}

// ---------------------------------------------------------------------------
// stakeClaimRewards

struct ClaimStakingRewards;

#[async_trait]
impl Action for ClaimStakingRewards {
    fn id(&self) -> StepId {
        StepId::from("claimStakingRewards")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Claim staking rewards".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        Ok(governance_call(ctx, "claimFromStakingV1", vec![ctx.owner().into()]))
    }
}

pub struct StakeClaimRewards;

#[async_trait]
impl FlowDefinition for StakeClaimRewards {
    fn flow_id(&self) -> &'static str {
        "stakeClaimRewards"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id())
    }

    async fn plan(&self, _ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        Ok(vec![ClaimStakingRewards.id()])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "claimStakingRewards").then(|| Box::new(CallStep(ClaimStakingRewards)) as Box<dyn TxStep>)
    }
}

// ---------------------------------------------------------------------------
// allocateVotingPower / resetVotingAllocations

struct ResetAllocations;

#[async_trait]
impl Action for ResetAllocations {
    fn id(&self) -> StepId {
        StepId::from("resetAllocations")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Reset votes".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        let mut initiatives: Vec<Address> = Vec::new();
        for a in allocated_initiatives(ctx).await? {
            if !initiatives.contains(&a.recipient) {
                initiatives.push(a.recipient);
            }
        }
        Ok(reset_call(ctx, initiatives))
    }
}

/// Votos pedidos: `(iniciativa, monto, dirección)`.
fn requested_votes(ctx: &FlowCtx<'_>) -> Result<Vec<(Address, U256, VoteDirection)>, FlowError> {
    let mut out = Vec::new();
    for (i, entry) in ctx.request.list("allocations")?.iter().enumerate() {
        let record = entry.as_record()
                          .ok_or_else(|| FlowError::Decode(format!("allocations[{i}] is not a record")))?;
        let get = |name: &str| {
            record.get(name)
                  .ok_or_else(|| FlowError::Decode(format!("allocations[{i}].{name} missing")))
        };
        let initiative = get("initiative")?.as_address()
                                           .ok_or_else(|| FlowError::Decode(format!("allocations[{i}].initiative")))?;
        let amount = get("amount")?.as_dnum()
                                   .ok_or_else(|| FlowError::Decode(format!("allocations[{i}].amount")))?
                                   .to_wad()?;
        let direction = match get("vote")? {
            FieldValue::Enum(v) if v == VOTE_AGAINST => VoteDirection::Against,
            _ => VoteDirection::For,
        };
        out.push((initiative, amount, direction));
    }
    Ok(out)
}

struct AllocateLqty;

#[async_trait]
impl Action for AllocateLqty {
    fn id(&self) -> StepId {
        StepId::from("allocateLqty")
    }

    fn display_name(&self, _ctx: &FlowCtx<'_>) -> String {
        "Cast votes".into()
    }

    async fn call(&self, ctx: &FlowCtx<'_>) -> Result<ContractCall, FlowError> {
        Ok(allocate_call(ctx, &requested_votes(ctx)?))
    }
}

pub struct AllocateVotingPower;

#[async_trait]
impl FlowDefinition for AllocateVotingPower {
    fn flow_id(&self) -> &'static str {
        "allocateVotingPower"
    }

    fn shape(&self) -> RequestShape {
        let allocation = FieldType::Record(vec![FieldSpec::required("initiative", FieldType::Address),
                                                FieldSpec::required("vote",
                                                                    FieldType::Enum(&[VOTE_FOR, VOTE_AGAINST])),
                                                FieldSpec::required("amount", FieldType::Dnum)]);
        RequestShape::new(self.flow_id()).field(FieldSpec::required("allocations", FieldType::array_of(allocation)))
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        let votes = requested_votes(ctx)?;
        let state = user_state(ctx).await?;
        let total = votes.iter().try_fold(U256::ZERO, |acc, (_, amount, _)| acc.checked_add(*amount));
        match total {
            Some(t) if t <= state.staked() => {}
            _ => {
                return Err(DomainError::Validation(format!("votes exceed the staked balance of {}",
                                                           state.staked())).into())
            }
        }
        let mut plan = Vec::with_capacity(2);
        if !state.allocated.is_zero() {
            plan.push(ResetAllocations.id());
        }
        if votes.iter().any(|(_, amount, _)| !amount.is_zero()) {
            plan.push(AllocateLqty.id());
        }
        Ok(plan)
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        match id.as_str() {
            "resetAllocations" => Some(Box::new(CallStep(ResetAllocations))),
            "allocateLqty" => Some(Box::new(CallStep(AllocateLqty))),
            _ => None,
        }
    }
}

pub struct ResetVotingAllocations;

#[async_trait]
impl FlowDefinition for ResetVotingAllocations {
    fn flow_id(&self) -> &'static str {
        "resetVotingAllocations"
    }

    fn shape(&self) -> RequestShape {
        RequestShape::new(self.flow_id())
    }

    async fn plan(&self, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
        if user_state(ctx).await?.allocated.is_zero() {
            return Ok(vec![]);
        }
        Ok(vec![ResetAllocations.id()])
    }

    fn step(&self, id: &StepId) -> Option<Box<dyn TxStep>> {
        (id.as_str() == "resetAllocations").then(|| Box::new(CallStep(ResetAllocations)) as Box<dyn TxStep>)
    }
}
