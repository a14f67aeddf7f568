//! tx-adapters: implementaciones en memoria de los puertos del motor.
//!
//! - `InMemoryChain`: wallet + nodo + relay + índice de lectura guionables.
//!   Es el doble de pruebas compartido por los crates del workspace y la
//!   base de la demo.
//! - `InMemoryLocalState` / `JsonFileLocalState`: estado local durable con
//!   semántica de merge.

pub mod chain;
pub mod local_state;

pub use chain::{InMemoryChain, Outcome};
pub use local_state::{merge_json, InMemoryLocalState, JsonFileLocalState};
