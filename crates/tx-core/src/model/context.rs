use std::sync::Arc;

use alloy_primitives::Address;
use tx_domain::{ApprovalPolicy, Contracts};

use crate::chain::{LocalStateStore, ReadIndex, ReceiptSource, Relay, Wallet};
use crate::config::EngineConfig;
use crate::model::ExecutionPath;

/// Colaboradores externos alcanzados por el motor.
#[derive(Clone)]
pub struct Ports {
    pub wallet: Arc<dyn Wallet>,
    pub receipts: Arc<dyn ReceiptSource>,
    /// Sólo presente para cuentas multisig.
    pub relay: Option<Arc<dyn Relay>>,
    pub index: Arc<dyn ReadIndex>,
    pub local_state: Arc<dyn LocalStateStore>,
}

/// Contexto de la cuenta conectada. Se arma antes del run y no cambia
/// mientras dura: la política de aprobación es una foto tomada al crearlo.
#[derive(Clone)]
pub struct AccountContext {
    pub account: Address,
    pub ports: Ports,
    pub contracts: Arc<Contracts>,
    pub approval_policy: ApprovalPolicy,
    pub relayed: bool,
    pub config: EngineConfig,
}

impl AccountContext {
    pub fn new(account: Address, ports: Ports, contracts: Arc<Contracts>, config: EngineConfig) -> Self {
        Self { account,
               ports,
               contracts,
               approval_policy: config.approval_policy,
               relayed: false,
               config }
    }

    pub fn with_approval_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.approval_policy = policy;
        self
    }

    /// Marca la cuenta como multisig: los envíos devuelven hashes del relay.
    pub fn relayed(mut self) -> Self {
        self.relayed = true;
        self
    }

    pub fn execution_path(&self) -> ExecutionPath {
        if self.relayed {
            ExecutionPath::Relayed
        } else {
            ExecutionPath::Direct
        }
    }
}
