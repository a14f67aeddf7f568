//! txflow: fachada del motor de flujos de transacciones.
//!
//! - `app::TxFlow` junta registry y executor: recibe el payload crudo de la
//!   UI, lo valida, planifica y ejecuta.
//! - `config` expone `AppConfig` (`.env` + variables `TXFLOW_*`).
//! - `deployment` carga la tabla de contratos desde JSON.
//!
//! Los crates del workspace se re-exportan para los clientes que necesiten
//! bajar de nivel.

pub mod app;
pub mod config;
pub mod deployment;
pub mod errors;

pub use app::TxFlow;
pub use config::{AppConfig, CONFIG};
pub use errors::AppError;

pub use tx_adapters as adapters;
pub use tx_core as core;
pub use tx_domain as domain;
pub use tx_flows as flows;
pub use tx_policies as policies;
