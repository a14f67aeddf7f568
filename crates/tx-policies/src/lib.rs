//! tx-policies: políticas puras usadas por los flujos.
//!
//! Hoy contiene la reasignación proporcional de votos que necesita el flujo
//! de unstake: al retirar parte del stake, las asignaciones previas deben
//! rehacerse sobre el saldo restante manteniendo las proporciones.

pub mod reallocation;

pub use reallocation::{reallocate, Reallocation, SHARE_PRECISION};
