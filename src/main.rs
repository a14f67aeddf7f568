//! Demo: tres flujos contra una cadena en memoria.
//!
//! Con `TXFLOW_CONTRACTS_PATH` usa esa tabla de contratos; con
//! `TXFLOW_LOCAL_STATE_PATH` persiste el estado local en ese archivo.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use tx_adapters::{InMemoryChain, InMemoryLocalState, JsonFileLocalState};
use tx_core::{AccountContext, CallValue, CancellationToken, ChainError, LocalStateStore};
use tx_domain::{BranchContracts, BranchId, Contracts, TroveId, VoteAllocation};
use txflow::{deployment, AppError, TxFlow, CONFIG};

const ACCOUNT: Address = Address::repeat_byte(0xaa);

fn demo_branch(id: u8, symbol: &str, native: bool) -> BranchContracts {
    BranchContracts { id: BranchId::new(id),
                      symbol: symbol.to_string(),
                      native,
                      coll_token: Address::repeat_byte(0x10 + id),
                      borrower_operations: Address::repeat_byte(0x20 + id),
                      trove_manager: Address::repeat_byte(0x30 + id),
                      stability_pool: Address::repeat_byte(0x40 + id),
                      coll_surplus_pool: Address::repeat_byte(0x50 + id),
                      zapper: Address::repeat_byte(0x60 + id),
                      leverage_zapper: Address::repeat_byte(0x70 + id) }
}

fn demo_contracts() -> Contracts {
    Contracts { bold_token: Address::repeat_byte(1),
                collateral_registry: Address::repeat_byte(2),
                governance: Address::repeat_byte(3),
                lqty_token: Address::repeat_byte(4),
                sbold: Address::repeat_byte(5),
                multisend: Address::repeat_byte(6),
                branches: vec![demo_branch(0, "ETH", true), demo_branch(1, "wstETH", false)] }
}

fn envelope(flow: &str, fields: Value) -> Value {
    json!({
        "flowId": flow,
        "fields": fields,
        "navigation": { "successLink": ["/", "Dashboard"], "successMessage": "Done" },
    })
}

/// Estado de cadena de la demo: sin allowances, una colisión de owner index
/// y votos previos en tres iniciativas.
fn script_chain(chain: &InMemoryChain, contracts: &Contracts) -> Result<(), AppError> {
    let coll = contracts.branch(BranchId::new(1)).map_err(|e| AppError::Config(e.to_string()))?;
    chain.set_read_any(contracts.bold_token, "allowance", U256::ZERO.into());
    chain.set_read_any(coll.coll_token, "allowance", U256::ZERO.into());
    chain.fail_submit("openTrove", ChainError::reverted("TroveExists()"));
    chain.set_trove(coll.id, ACCOUNT, 1, TroveId(U256::from(0x1001u64)));

    chain.set_read(contracts.governance,
                   "userStates",
                   vec![ACCOUNT.into()],
                   CallValue::uints([U256::ZERO, U256::ZERO, U256::from(200u64), U256::ZERO]));
    chain.set_allocations(ACCOUNT,
                          vec![VoteAllocation::new(Address::repeat_byte(0x0a), U256::from(100u64), U256::ZERO),
                               VoteAllocation::new(Address::repeat_byte(0x0b), U256::ZERO, U256::from(50u64)),
                               VoteAllocation::new(Address::repeat_byte(0x0c), U256::from(50u64), U256::ZERO)]);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                                                  EnvFilter::new("info")
                                              }))
                             .with_target(true)
                             .init();

    let config = CONFIG.clone();
    let contracts = match config.contracts_path {
        Some(_) => deployment::from_config(&config)?,
        None => demo_contracts(),
    };
    let local_state: Arc<dyn LocalStateStore> = match &config.local_state_path {
        Some(path) => Arc::new(JsonFileLocalState::new(path)),
        None => Arc::new(InMemoryLocalState::new()),
    };

    let chain = InMemoryChain::new();
    script_chain(&chain, &contracts)?;
    let account = AccountContext::new(ACCOUNT, chain.ports(local_state), Arc::new(contracts), config.engine.clone());
    let txflow = TxFlow::in_memory();

    let requests = [envelope("sboldDeposit", json!({ "amount": ["250", 0] })),
                    envelope("openBorrowPosition",
                             json!({ "branchId": 1, "ownerIndex": 0, "collAmount": ["10", 0],
                                     "boldAmount": ["5000", 0], "annualInterestRate": ["45", 3] })),
                    envelope("unstakeDeposit", json!({ "amount": ["110", 18] }))];

    for raw in &requests {
        let (kind, steps) = txflow.preview(raw, &account).await?;
        println!("== {kind}");
        for (id, name) in &steps {
            println!("   {id:<20} {name}");
        }
        let run = txflow.execute(raw, &account, CancellationToken::new()).await?;
        let events = txflow.events(run.id).len();
        if let Some(snapshot) = txflow.finish(run.id) {
            for step in &snapshot.steps {
                let block = step.receipt.map(|r| r.block_number);
                println!("   {:<20} {:<10} block={:?}", step.step_id, step.phase.as_str(), block);
            }
            println!("   completed={} events={}", snapshot.completed, events);
        }
    }

    println!("on-chain writes: {:?}", chain.written_functions());
    Ok(())
}
