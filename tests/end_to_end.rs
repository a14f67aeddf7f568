//! Flujos completos a través de la fachada, con estado local en archivo.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use serde_json::{json, Value};
use tx_adapters::{InMemoryChain, JsonFileLocalState};
use tx_core::{AccountContext, CallValue, CancellationToken, ChainError, EngineConfig, FlowError, FlowEventKind,
              StepPhase};
use tx_domain::{BranchContracts, BranchId, Contracts, TroveId};
use txflow::{AppError, TxFlow};

const OWNER: Address = Address::repeat_byte(0xaa);

fn contracts() -> Contracts {
    let branch = |id: u8, native: bool| BranchContracts { id: BranchId::new(id),
                                                          symbol: if native { "ETH".into() } else { "rETH".into() },
                                                          native,
                                                          coll_token: Address::repeat_byte(0x10 + id),
                                                          borrower_operations: Address::repeat_byte(0x20 + id),
                                                          trove_manager: Address::repeat_byte(0x30 + id),
                                                          stability_pool: Address::repeat_byte(0x40 + id),
                                                          coll_surplus_pool: Address::repeat_byte(0x50 + id),
                                                          zapper: Address::repeat_byte(0x60 + id),
                                                          leverage_zapper: Address::repeat_byte(0x70 + id) };
    Contracts { bold_token: Address::repeat_byte(1),
                collateral_registry: Address::repeat_byte(2),
                governance: Address::repeat_byte(3),
                lqty_token: Address::repeat_byte(4),
                sbold: Address::repeat_byte(5),
                multisend: Address::repeat_byte(6),
                branches: vec![branch(0, true), branch(1, false)] }
}

fn envelope(flow: &str, fields: Value) -> Value {
    json!({
        "flowId": flow,
        "fields": fields,
        "navigation": { "backLink": ["/borrow", "Back"], "successLink": ["/", "Dashboard"], "successMessage": "Done" },
    })
}

fn account(chain: &Arc<InMemoryChain>, local: Arc<JsonFileLocalState>) -> AccountContext {
    let config = EngineConfig { receipt_poll_interval: Duration::from_millis(50),
                                relay_poll_interval: Duration::from_millis(50),
                                ..EngineConfig::default() };
    AccountContext::new(OWNER, chain.ports(local), Arc::new(contracts()), config)
}

#[tokio::test(start_paused = true)]
async fn open_trove_is_recorded_in_the_local_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileLocalState::new(dir.path().join("state.json")));
    let chain = InMemoryChain::new();
    let c = contracts();
    chain.set_read_any(c.branches[1].coll_token, "allowance", U256::ZERO.into());
    chain.fail_submit("openTrove", ChainError::reverted("owner index already used"));
    chain.fail_submit("openTrove", ChainError::reverted("owner index already used"));
    chain.set_trove(BranchId::new(1), OWNER, 7, TroveId(U256::from(0xbeefu64)));
    // el índice queda un bloque atrás en la primera consulta
    chain.script_index_heads(vec![Ok(1)]);
    let account = account(&chain, local.clone());
    let txflow = TxFlow::in_memory();

    let raw = envelope("openBorrowPosition",
                       json!({ "branchId": 1, "ownerIndex": 5, "collAmount": ["12", 0],
                               "boldAmount": ["3000", 0], "annualInterestRate": ["6", 2] }));
    let (_, steps) = txflow.preview(&raw, &account).await.unwrap();
    assert_eq!(steps.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(), vec!["approveCollateral", "openTrove"]);

    let run = txflow.execute(&raw, &account, CancellationToken::new()).await.unwrap();

    assert_eq!(chain.written_functions(), vec!["approve", "openTrove"]);
    assert_eq!(chain.writes()[1].args[1], CallValue::from(7u64));
    let known = local.get("knownTroves").unwrap().unwrap();
    assert_eq!(known["1:0xbeef"]["ownerIndex"], json!(7));

    let snapshot = txflow.snapshot(run.id).unwrap();
    assert!(snapshot.completed);
    assert!(snapshot.steps.iter().all(|s| s.phase == StepPhase::Confirmed));
    assert_eq!(snapshot.steps[1].index_lag_polls, 1);
    assert!(!snapshot.waiting_on_index);
}

#[tokio::test(start_paused = true)]
async fn relayed_runs_confirm_through_the_relay() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileLocalState::new(dir.path().join("state.json")));
    let chain = InMemoryChain::new();
    chain.set_relayed(true);
    chain.set_relay_awaiting_polls(4);
    let account = account(&chain, local).relayed();
    let txflow = TxFlow::in_memory();

    let raw = envelope("earnDeposit", json!({ "branchId": 0, "amount": ["100", 0] }));
    let run = txflow.execute(&raw, &account, CancellationToken::new()).await.unwrap();

    let events = txflow.events(run.id);
    assert!(matches!(&events[0].kind, FlowEventKind::FlowPlanned { relayed: true, .. }));
    let submitted_then_confirmed: Vec<_> = events.iter().map(|e| e.kind.name()).collect();
    assert_eq!(submitted_then_confirmed,
               vec!["FlowPlanned", "StepAwaitingSignature", "StepSubmitted", "StepConfirmed", "FlowCompleted"]);
}

#[tokio::test]
async fn invalid_payloads_never_reach_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileLocalState::new(dir.path().join("state.json")));
    let chain = InMemoryChain::new();
    let account = account(&chain, local);
    let txflow = TxFlow::in_memory();

    let raw = envelope("earnDeposit", json!({ "branchId": 0, "amount": ["100", 0], "slippage": 3 }));
    let err = txflow.execute(&raw, &account, CancellationToken::new()).await.unwrap_err();

    match err.flow_error() {
        Some(FlowError::Validation(v)) => assert!(v.has_issue_at("fields.slippage")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(chain.writes().is_empty());
    assert!(txflow.executor().event_store().flow_ids().is_empty());
}

#[tokio::test]
async fn cancelled_runs_stop_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileLocalState::new(dir.path().join("state.json")));
    let chain = InMemoryChain::new();
    let account = account(&chain, local);
    let txflow = TxFlow::in_memory();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let raw = envelope("stakeClaimRewards", json!({}));
    let err = txflow.execute(&raw, &account, cancel).await.unwrap_err();

    let flow_id = match err {
        AppError::Failed(failure) => {
            assert_eq!(failure.error, FlowError::Cancelled);
            failure.flow_id
        }
        other => panic!("unexpected {other:?}"),
    };
    txflow.finish(flow_id);
    assert!(txflow.executor().event_store().flow_ids().is_empty());
}

#[tokio::test]
async fn finished_runs_release_their_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileLocalState::new(dir.path().join("state.json")));
    let chain = InMemoryChain::new();
    let account = account(&chain, local);
    let txflow = TxFlow::in_memory();
    let raw = envelope("earnDeposit", json!({ "branchId": 0, "amount": ["100", 0] }));

    for _ in 0..50 {
        let run = txflow.execute(&raw, &account, CancellationToken::new()).await.unwrap();
        let snapshot = txflow.finish(run.id).unwrap();
        assert!(snapshot.completed);
        assert_eq!(snapshot.flow_id, run.id);
        assert!(txflow.finish(run.id).is_none());
    }

    assert!(txflow.executor().event_store().flow_ids().is_empty());
    assert_eq!(chain.written_functions().len(), 50);
}

#[test]
fn preview_can_be_driven_from_sync_code() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(JsonFileLocalState::new(dir.path().join("state.json")));
    let chain = InMemoryChain::new();
    let account = account(&chain, local);
    let txflow = TxFlow::in_memory();

    let raw = envelope("redeemCollateral", json!({ "amount": ["500", 0], "maxFeePercentage": ["1", 2] }));
    let (kind, steps) = tokio_test::block_on(txflow.preview(&raw, &account)).unwrap();
    assert_eq!(kind.id(), "redeemCollateral");
    assert_eq!(steps[0].1, "Redeem BOLD");
}
