//! Definición de flujos, estado de un run y snapshot reconstruido por replay.

mod definition;
mod run;
mod snapshot;

pub use definition::FlowDefinition;
pub use run::FlowRun;
pub use snapshot::{FlowSnapshot, StepView};
