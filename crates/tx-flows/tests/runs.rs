mod common;

use alloy_primitives::{Address, U256};
use common::{dnum, envelope, wad, Harness, OWNER};
use serde_json::json;
use tx_core::constants::SIGNAL_INDEX_COLLISION;
use tx_core::{CallValue, ChainError, ContractCall, FlowError, FlowEventKind, IndexError, RawOperation};
use tx_domain::{ApprovalPolicy, BranchId, DomainError, TroveId, VoteAllocation};
use tx_flows::KNOWN_TROVES_KEY;

fn open_request(owner_index: u64) -> serde_json::Value {
    envelope("openBorrowPosition",
             json!({ "branchId": 1, "ownerIndex": owner_index, "collAmount": dnum(10),
                     "boldAmount": dnum(2000), "annualInterestRate": ["5", 2] }))
}

#[tokio::test(start_paused = true)]
async fn open_trove_retries_on_owner_index_collision() {
    let h = Harness::new();
    let b1 = h.contracts().branches[1].clone();
    h.set_allowance(b1.coll_token, b1.borrower_operations, wad(10));
    h.chain.fail_submit("openTrove", ChainError::reverted("TroveExists()"));
    h.chain.set_trove(BranchId::new(1), OWNER, 4, TroveId(U256::from(0x4du64)));

    let run = h.run(open_request(3)).await.unwrap();

    assert!(run.is_completed());
    let writes = h.chain.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].function, "openTrove");
    assert_eq!(writes[0].to, b1.borrower_operations);
    assert_eq!(writes[0].args[1], CallValue::from(4u64));
    assert_eq!(writes[0].args[2], CallValue::from(wad(10)));

    let collisions = h.executor
                      .events(run.id)
                      .into_iter()
                      .filter(|e| matches!(&e.kind, FlowEventKind::StepSignal { signal, .. } if signal == SIGNAL_INDEX_COLLISION))
                      .count();
    assert_eq!(collisions, 1);

    let known = h.local.get(KNOWN_TROVES_KEY).unwrap();
    assert_eq!(known["1:0x4d"]["ownerIndex"], json!(4));
}

#[tokio::test(start_paused = true)]
async fn open_trove_fails_when_the_index_never_shows_it() {
    let h = Harness::new();
    let b1 = h.contracts().branches[1].clone();
    h.set_allowance(b1.coll_token, b1.borrower_operations, wad(10));

    let failure = h.run(open_request(0)).await.unwrap_err();

    assert!(matches!(failure.error, FlowError::Index(IndexError::NotFound(_))));
    assert_eq!(failure.failed_step.as_ref().map(|s| s.as_str()), Some("openTrove"));
    assert!(h.local.get(KNOWN_TROVES_KEY).is_none());
}

#[tokio::test(start_paused = true)]
async fn native_open_sends_collateral_as_value() {
    let h = Harness::new();
    let b0 = h.contracts().branches[0].clone();
    h.chain.set_trove(BranchId::new(0), OWNER, 0, TroveId(U256::from(1u64)));
    let raw = envelope("openBorrowPosition",
                       json!({ "branchId": 0, "ownerIndex": 0, "collAmount": dnum(3),
                               "boldAmount": dnum(2000), "annualInterestRate": ["5", 2] }));

    h.run(raw).await.unwrap();

    let writes = h.chain.writes();
    assert_eq!(writes[0].function, "openTroveWithRawETH");
    assert_eq!(writes[0].to, b0.zapper);
    assert_eq!(writes[0].value, wad(3));
}

#[tokio::test(start_paused = true)]
async fn approval_precedes_the_action_on_chain() {
    let h = Harness::new();
    let c = h.contracts().clone();
    h.set_allowance(c.bold_token, c.sbold, U256::ZERO);

    h.run(envelope("sboldDeposit", json!({ "amount": dnum(100) }))).await.unwrap();

    assert_eq!(h.chain.written_functions(), vec!["approve", "deposit"]);
    let approve = &h.chain.writes()[0];
    assert_eq!(approve.to, c.bold_token);
    // política exacta por defecto
    assert_eq!(approve.args, vec![CallValue::from(c.sbold), CallValue::from(wad(100))]);
}

#[tokio::test(start_paused = true)]
async fn infinite_policy_approves_the_maximum_allowance() {
    let mut h = Harness::new();
    h.account = h.account.with_approval_policy(ApprovalPolicy::Infinite);
    let c = h.contracts().clone();
    let b1 = c.branches[1].clone();
    h.set_allowance(c.bold_token, c.sbold, U256::ZERO);
    h.set_allowance(b1.coll_token, b1.borrower_operations, U256::ZERO);

    h.run(envelope("sboldDeposit", json!({ "amount": dnum(100) }))).await.unwrap();
    h.run(envelope("updateBorrowPosition",
                   json!({ "branchId": 1, "troveId": "0x2a", "collChange": dnum(3), "isCollIncrease": true })))
     .await
     .unwrap();

    assert_eq!(h.chain.written_functions(), vec!["approve", "deposit", "approve", "adjustTrove"]);
    let writes = h.chain.writes();
    assert_eq!(writes[0].args, vec![CallValue::from(c.sbold), CallValue::from(U256::MAX)]);
    assert_eq!(writes[2].to, b1.coll_token);
    assert_eq!(writes[2].args, vec![CallValue::from(b1.borrower_operations), CallValue::from(U256::MAX)]);
    // la acción sigue usando el monto pedido, no la allowance aprobada
    assert!(!writes[1].args.contains(&CallValue::from(U256::MAX)));
}

#[tokio::test(start_paused = true)]
async fn approval_policy_is_taken_from_each_account_context() {
    let mut h = Harness::new();
    let c = h.contracts().clone();
    h.set_allowance(c.bold_token, c.sbold, U256::ZERO);
    let raw = envelope("sboldDeposit", json!({ "amount": dnum(7) }));

    h.account = h.account.with_approval_policy(ApprovalPolicy::Infinite);
    h.run(raw.clone()).await.unwrap();
    h.account = h.account.with_approval_policy(ApprovalPolicy::Exact);
    h.run(raw).await.unwrap();

    let approvals: Vec<_> = h.chain.writes().into_iter().filter(|w| w.function == "approve").collect();
    assert_eq!(approvals.len(), 2);
    assert_eq!(approvals[0].args[1], CallValue::from(U256::MAX));
    assert_eq!(approvals[1].args[1], CallValue::from(wad(7)));
}

#[tokio::test(start_paused = true)]
async fn unstake_within_the_unallocated_balance_withdraws_directly() {
    let h = Harness::new();
    h.set_user_state(U256::from(10u64), U256::from(100u64));

    h.run(envelope("unstakeDeposit", json!({ "amount": ["10", 18] }))).await.unwrap();

    let writes = h.chain.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].function, "withdrawLQTY");
    assert_eq!(writes[0].args, vec![CallValue::from(10u64)]);
}

#[tokio::test(start_paused = true)]
async fn unstake_reallocates_the_remaining_stake() {
    let h = Harness::new();
    let (x, y, z) = (Address::repeat_byte(0x0a), Address::repeat_byte(0x0b), Address::repeat_byte(0x0c));
    h.set_user_state(U256::ZERO, U256::from(200u64));
    h.chain.set_allocations(OWNER,
                            vec![VoteAllocation::new(x, U256::from(100u64), U256::ZERO),
                                 VoteAllocation::new(y, U256::ZERO, U256::from(50u64)),
                                 VoteAllocation::new(z, U256::from(50u64), U256::ZERO)]);

    h.run(envelope("unstakeDeposit", json!({ "amount": ["110", 18] }))).await.unwrap();

    let writes = h.chain.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].function, "multiDelegateCall");
    let batch: Vec<&ContractCall> = writes[0].args[0].as_list()
                                                     .unwrap()
                                                     .iter()
                                                     .map(|v| v.as_call().unwrap())
                                                     .collect();
    let functions: Vec<_> = batch.iter().map(|c| c.function.as_str()).collect();
    assert_eq!(functions, vec!["resetAllocations", "withdrawLQTY", "allocateLQTY"]);
    assert_eq!(batch[0].args, vec![CallValue::addresses([x, y, z]), CallValue::from(true)]);
    assert_eq!(batch[1].args, vec![CallValue::from(110u64)]);
    let u = |n: u64| U256::from(n);
    assert_eq!(batch[2].args,
               vec![CallValue::List(vec![]),
                    CallValue::addresses([x, y, z]),
                    CallValue::uints([u(45), u(0), u(23)]),
                    CallValue::uints([u(0), u(22), u(0)])]);
}

#[tokio::test(start_paused = true)]
async fn unstake_everything_skips_the_reallocation() {
    let h = Harness::new();
    let x = Address::repeat_byte(0x0a);
    h.set_user_state(U256::from(20u64), U256::from(80u64));
    h.chain.set_allocations(OWNER, vec![VoteAllocation::new(x, U256::from(80u64), U256::ZERO)]);

    h.run(envelope("unstakeDeposit", json!({ "amount": ["100", 18] }))).await.unwrap();

    let call = h.chain.writes()[0].clone();
    let functions: Vec<_> = call.args[0].as_list()
                                        .unwrap()
                                        .iter()
                                        .map(|v| v.as_call().unwrap().function.clone())
                                        .collect();
    assert_eq!(functions, vec!["resetAllocations", "withdrawLQTY"]);
}

#[tokio::test(start_paused = true)]
async fn unstake_fails_fast_when_allocations_cannot_be_read() {
    let h = Harness::new();
    h.set_user_state(U256::from(1u64), U256::from(100u64));
    h.chain.set_allocations_unavailable(true);

    let failure = h.run(envelope("unstakeDeposit", json!({ "amount": ["50", 18] }))).await.unwrap_err();

    match &failure.error {
        FlowError::DegradedRead(msg) => assert!(msg.contains("reset allocations manually")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.chain.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unstake_more_than_staked_is_rejected() {
    let h = Harness::new();
    h.set_user_state(U256::from(1u64), U256::from(2u64));
    let failure = h.run(envelope("unstakeDeposit", json!({ "amount": ["5", 18] }))).await.unwrap_err();
    assert!(matches!(failure.error, FlowError::Domain(DomainError::Validation(_))));
    assert!(h.chain.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn relayed_claim_all_goes_out_as_one_multisend() {
    let h = Harness::relayed();
    h.chain.set_relay_awaiting_polls(2);
    h.set_sp_gains(0, wad(1), U256::ZERO);
    h.set_sp_gains(1, U256::ZERO, U256::ZERO);
    h.set_sp_gains(2, U256::ZERO, U256::from(3u64));

    let run = h.run(envelope("earnClaimAllRewards", json!({}))).await.unwrap();

    assert!(run.is_completed());
    assert!(h.chain.writes().is_empty());
    let raw = h.chain.raw_transactions();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].to, h.contracts().multisend);
    assert_eq!(raw[0].operation, RawOperation::DelegateCall);
    let pools: Vec<_> = raw[0].calls.iter().map(|c| c.to).collect();
    assert_eq!(pools, vec![h.contracts().branches[0].stability_pool, h.contracts().branches[2].stability_pool]);
    assert!(raw[0].calls.iter().all(|c| c.function == "withdrawFromSP"));
}

#[tokio::test(start_paused = true)]
async fn withdraw_all_uses_each_current_deposit() {
    let h = Harness::new();
    h.set_sp_deposit(0, U256::ZERO);
    h.set_sp_deposit(1, wad(5));
    h.set_sp_deposit(2, wad(7));

    h.run(envelope("earnWithdrawAll", json!({}))).await.unwrap();

    let writes = h.chain.writes();
    let amounts: Vec<_> = writes.iter().map(|c| (c.to, c.args[0].clone())).collect();
    assert_eq!(amounts,
               vec![(h.contracts().branches[1].stability_pool, CallValue::from(wad(5))),
                    (h.contracts().branches[2].stability_pool, CallValue::from(wad(7)))]);
}

#[tokio::test(start_paused = true)]
async fn allocation_votes_follow_the_requested_directions() {
    let h = Harness::new();
    let (a, b) = (Address::repeat_byte(0x0a), Address::repeat_byte(0x0b));
    h.set_user_state(wad(50), U256::ZERO);
    let raw = envelope("allocateVotingPower",
                       json!({ "allocations": [
                           { "initiative": a.to_string(), "vote": "for", "amount": dnum(30) },
                           { "initiative": b.to_string(), "vote": "against", "amount": dnum(20) },
                       ] }));

    h.run(raw).await.unwrap();

    let call = &h.chain.writes()[0];
    assert_eq!(call.function, "allocateLQTY");
    assert_eq!(call.args[2], CallValue::uints([wad(30), U256::ZERO]));
    assert_eq!(call.args[3], CallValue::uints([U256::ZERO, wad(20)]));
}

#[tokio::test(start_paused = true)]
async fn redemption_defaults_the_iteration_cap() {
    let h = Harness::new();
    let raw = envelope("redeemCollateral", json!({ "amount": dnum(1000), "maxFeePercentage": ["5", 3] }));
    h.run(raw).await.unwrap();
    let call = &h.chain.writes()[0];
    assert_eq!(call.to, h.contracts().collateral_registry);
    assert_eq!(call.args[1], CallValue::from(50u64));
}
