//! tx-core: motor de orquestación de flujos de transacciones.
//!
//! Convierte la intención del usuario (un `FlowRequest` validado) en una
//! secuencia ordenada de transacciones, las ejecuta una a una contra una
//! wallet (EOA o multisig con relay), espera su confirmación y la
//! sincronización del índice de lectura antes de declarar éxito.
pub mod barrier;
pub mod chain;
pub mod codec;
pub mod config;
pub mod confirm;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod flow;
pub mod hashing;
pub mod model;
pub mod retry;
pub mod step;
mod wait;

pub use barrier::{BarrierReport, ConsistencyBarrier, IndexLag};
pub use chain::{LocalStateStore, ReadIndex, ReceiptSource, Relay, Wallet};
pub use codec::{validate, FieldSpec, FieldType, Refinement, RequestShape};
pub use config::{init_dotenv, EngineConfig};
pub use confirm::ConfirmationWaiter;
pub use engine::{FlowCtx, FlowExecutor};
pub use errors::{ChainError, FieldIssue, FlowError, FlowFailure, IndexError, LocalStateError, ValidationError};
pub use event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use flow::{FlowDefinition, FlowRun, FlowSnapshot, StepView};
pub use model::{AccountContext, CallValue, ContractCall, ExecutionPath, FieldValue, FlowRequest, Link, Navigation, Ports,
                RawOperation, RawTransaction, Receipt, ReceiptStatus, RelayStatus, TxRef};
pub use retry::retry_with_index;
pub use step::{StepId, StepPhase, StepStatus, TxStep};

pub use tokio_util::sync::CancellationToken;
