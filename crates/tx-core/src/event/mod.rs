//! Eventos de un run y almacenamiento append-only.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{FlowEvent, FlowEventKind};
