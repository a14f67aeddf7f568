//! Ejecución de flujos: contexto por paso (`FlowCtx`) y el executor que
//! conduce cada paso por la máquina de estados.

mod executor;
mod flow_ctx;

pub use executor::FlowExecutor;
pub use flow_ctx::FlowCtx;
