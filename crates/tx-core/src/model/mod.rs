//! Modelos compartidos: requests, llamadas a contratos, recibos y el
//! contexto de cuenta entregado a cada paso.

mod call;
mod context;
mod receipt;
mod request;

pub use call::{CallValue, ContractCall, RawOperation, RawTransaction};
pub use context::{AccountContext, Ports};
pub use receipt::{ExecutionPath, Receipt, ReceiptStatus, RelayStatus, TxRef};
pub use request::{FieldValue, FlowRequest, Link, Navigation};
