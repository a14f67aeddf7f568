//! tx-flows: catálogo cerrado de flujos del protocolo.
//!
//! Cada variante de `FlowKind` aporta la forma de su request, su
//! planificador y su tabla de pasos. `FlowKind` implementa
//! `tx_core::FlowDefinition` con un `match` exhaustivo, así que agregar un
//! flujo sin planificador o sin pasos no compila.

mod common;
pub mod flows;
pub mod kind;
pub mod registry;

pub use kind::FlowKind;
pub use registry::FlowRegistry;

/// Clave del estado local donde se registran las posiciones abiertas.
pub const KNOWN_TROVES_KEY: &str = "knownTroves";
