//! Fixture compartida: despliegue de tres branches sobre `InMemoryChain`.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use serde_json::{json, Value};
use tx_adapters::{InMemoryChain, InMemoryLocalState};
use tx_core::{AccountContext, CallValue, CancellationToken, EngineConfig, FlowError, FlowExecutor, FlowFailure,
              FlowRun, InMemoryEventStore};
use tx_domain::{BranchContracts, BranchId, Contracts};
use tx_flows::{FlowKind, FlowRegistry};

pub const OWNER: Address = Address::repeat_byte(0xaa);
pub const PROXY: Address = Address::repeat_byte(0xab);

pub fn branch(id: u8, symbol: &str, native: bool) -> BranchContracts {
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

/// Branch 0 nativo (ETH), 1 y 2 con colateral ERC20.
pub fn contracts() -> Contracts {
    Contracts { bold_token: Address::repeat_byte(1),
                collateral_registry: Address::repeat_byte(2),
                governance: Address::repeat_byte(3),
                lqty_token: Address::repeat_byte(4),
                sbold: Address::repeat_byte(5),
                multisend: Address::repeat_byte(6),
                branches: vec![branch(0, "ETH", true), branch(1, "wstETH", false), branch(2, "rETH", false)] }
}

pub fn wad(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// Monto entero en la forma `[valor, decimales]` del codec.
pub fn dnum(n: u64) -> Value {
    json!([n.to_string(), 0])
}

pub fn envelope(flow: &str, fields: Value) -> Value {
    json!({
        "flowId": flow,
        "fields": fields,
        "navigation": { "successLink": ["/", "Dashboard"], "successMessage": "Done" },
    })
}

pub struct Harness {
    pub chain: Arc<InMemoryChain>,
    pub local: Arc<InMemoryLocalState>,
    pub account: AccountContext,
    pub executor: FlowExecutor<InMemoryEventStore>,
}

impl Harness {
    pub fn new() -> Self {
        let chain = InMemoryChain::new();
        let local = Arc::new(InMemoryLocalState::new());
        let config = EngineConfig { receipt_poll_interval: Duration::from_millis(10),
                                    relay_poll_interval: Duration::from_millis(10),
                                    ..EngineConfig::default() };
        let account = AccountContext::new(OWNER, chain.ports(local.clone()), Arc::new(contracts()), config);
        Self { chain,
               local,
               account,
               executor: FlowExecutor::new(Arc::new(InMemoryEventStore::new())) }
    }

    /// Cuenta multisig: los envíos pasan por el relay.
    pub fn relayed() -> Self {
        let mut h = Self::new();
        h.chain.set_relayed(true);
        h.account = h.account.relayed();
        h
    }

    pub fn contracts(&self) -> &Contracts {
        &self.account.contracts
    }

    pub async fn plan(&self, raw: Value) -> Result<Vec<String>, FlowError> {
        let (kind, request) = FlowRegistry::validate(&raw)?;
        let plan = self.executor.plan(&kind, &request, &self.account).await?;
        Ok(plan.into_iter().map(|id| id.as_str().to_string()).collect())
    }

    pub async fn run(&self, raw: Value) -> Result<FlowRun, FlowFailure> {
        let (kind, request): (FlowKind, _) = FlowRegistry::validate(&raw).expect("valid request");
        self.executor.run(&kind, request, &self.account, CancellationToken::new()).await
    }

    pub fn set_allowance(&self, token: Address, spender: Address, amount: U256) {
        self.chain.set_read(token, "allowance", vec![OWNER.into(), spender.into()], amount.into());
    }

    /// `userStates(owner)` → `(unallocated, offset, allocated, offset)`.
    pub fn set_user_state(&self, unallocated: U256, allocated: U256) {
        let governance = self.contracts().governance;
        self.chain.set_read(governance,
                            "userStates",
                            vec![OWNER.into()],
                            CallValue::uints([unallocated, U256::ZERO, allocated, U256::ZERO]));
    }

    pub fn set_user_proxy(&self) {
        let governance = self.contracts().governance;
        self.chain.set_read(governance, "deriveUserProxyAddress", vec![OWNER.into()], PROXY.into());
    }

    pub fn set_sp_deposit(&self, branch: u8, amount: U256) {
        let pool = self.contracts().branches[branch as usize].stability_pool;
        self.chain.set_read(pool, "getCompoundedBoldDeposit", vec![OWNER.into()], amount.into());
    }

    pub fn set_sp_gains(&self, branch: u8, yield_gain: U256, coll_gain: U256) {
        let pool = self.contracts().branches[branch as usize].stability_pool;
        self.chain.set_read(pool, "getDepositorYieldGain", vec![OWNER.into()], yield_gain.into());
        self.chain.set_read(pool, "getDepositorCollGain", vec![OWNER.into()], coll_gain.into());
    }

    pub fn set_surplus(&self, branch: u8, amount: U256) {
        let pool = self.contracts().branches[branch as usize].coll_surplus_pool;
        self.chain.set_read(pool, "getCollateral", vec![OWNER.into()], amount.into());
    }
}
