//! Pasos de un flujo: identificadores, estado y el trait `TxStep`.

mod definition;
mod id;
mod status;

pub use definition::TxStep;
pub use id::StepId;
pub use status::{StepPhase, StepStatus};
