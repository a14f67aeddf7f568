//! tx-domain: tipos de valor del protocolo (montos, branches, troves,
//! asignaciones de voto y tabla de contratos).
//!
//! Este crate no conoce el motor de flujos; sólo define los objetos de dominio
//! que los flujos y el motor intercambian.

pub mod allocation;
pub mod amount;
pub mod approval;
pub mod branch;
pub mod contracts;
pub mod error;

pub use alloy_primitives::{Address, B256, U256};
pub use allocation::{VoteAllocation, VoteDirection};
pub use amount::Dnum;
pub use approval::ApprovalPolicy;
pub use branch::{BranchId, TroveId};
pub use contracts::{BranchContracts, Contracts};
pub use error::DomainError;
