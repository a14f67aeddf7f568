//! Waiter y barrera del motor sobre la cadena en memoria.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tx_adapters::{InMemoryChain, Outcome};
use tx_core::{ConfirmationWaiter, ConsistencyBarrier, ContractCall, EngineConfig, FlowError, IndexError, ReadIndex,
              ReceiptSource, Relay, TxRef, Wallet};

fn config() -> EngineConfig {
    EngineConfig { receipt_poll_interval: Duration::from_millis(100),
                   relay_poll_interval: Duration::from_millis(500),
                   ..EngineConfig::default() }
}

fn call(function: &str) -> ContractCall {
    ContractCall::new(Address::repeat_byte(0x42), function, vec![])
}

#[tokio::test(start_paused = true)]
async fn test_direct_receipt_after_pending_polls() {
    let chain = InMemoryChain::new();
    chain.set_pending_polls(2);
    let hash = chain.write_contract(&call("deposit")).await.unwrap();

    let waiter = ConfirmationWaiter::new(chain.clone() as Arc<dyn ReceiptSource>, &config());
    let receipt = waiter.wait(TxRef::direct(hash)).await.unwrap();

    assert_eq!(receipt.tx_hash, hash);
    assert_eq!(receipt.block_number, chain.block());
    assert_eq!(chain.receipt_polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_relayed_receipt_resolves_to_the_executed_hash() {
    let chain = InMemoryChain::new();
    chain.set_relayed(true);
    chain.set_relay_awaiting_polls(3);
    let safe_hash = chain.write_contract(&call("claim")).await.unwrap();

    let waiter = ConfirmationWaiter::new(chain.clone() as Arc<dyn ReceiptSource>, &config())
        .with_relay(Some(chain.clone() as Arc<dyn Relay>));
    let receipt = waiter.wait(TxRef::relayed(safe_hash)).await.unwrap();

    assert_ne!(receipt.tx_hash, safe_hash);
    assert_eq!(receipt.block_number, 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_proposal_is_dropped() {
    let chain = InMemoryChain::new();
    chain.set_relayed(true);
    chain.reject_proposals();
    let safe_hash = chain.write_contract(&call("claim")).await.unwrap();

    let waiter = ConfirmationWaiter::new(chain.clone() as Arc<dyn ReceiptSource>, &config())
        .with_relay(Some(chain.clone() as Arc<dyn Relay>));
    let err = waiter.wait(TxRef::relayed(safe_hash)).await.unwrap_err();
    assert!(matches!(err, FlowError::TxDropped { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_reverted_receipt_keeps_the_reason() {
    let chain = InMemoryChain::new();
    chain.script_outcome("withdraw", Outcome::Reverted(Some("InsufficientDeposit".into())));
    let hash = chain.write_contract(&call("withdraw")).await.unwrap();

    let waiter = ConfirmationWaiter::new(chain.clone() as Arc<dyn ReceiptSource>, &config());
    match waiter.wait(TxRef::direct(hash)).await.unwrap_err() {
        FlowError::TxReverted { tx_hash, reason } => {
            assert_eq!(tx_hash, hash);
            assert_eq!(reason.as_deref(), Some("InsufficientDeposit"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_barrier_treats_index_errors_as_lag() {
    let chain = InMemoryChain::new();
    chain.set_block(10);
    chain.script_index_heads(vec![Err(IndexError::Unavailable("502".into())), Ok(9)]);

    let barrier = ConsistencyBarrier::new(chain.clone() as Arc<dyn ReadIndex>);
    let report = barrier.await_indexed(10).await.unwrap();

    assert_eq!(report.polls, 3);
    assert_eq!(report.reached, 10);
    assert_eq!(chain.index_polls(), 3);
    // 1s + 2s de backoff
    assert!(report.waited >= Duration::from_secs(3));
}
