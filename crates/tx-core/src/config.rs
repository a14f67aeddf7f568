//! Configuración del motor desde variables de entorno.
//!
//! Variables (todas opcionales):
//! - `TXFLOW_RECEIPT_POLL_MS`: intervalo de consulta de recibos.
//! - `TXFLOW_RELAY_POLL_MS`: intervalo de consulta al relay multisig.
//! - `TXFLOW_INDEX_TIMEOUT_SECS`: límite total de la barrera del índice
//!   (sin definir = espera indefinida).
//! - `TXFLOW_APPROVAL_POLICY`: `exact` | `infinite`.

use std::env;
use std::time::Duration;

use log::warn;
use once_cell::sync::Lazy;
use tx_domain::ApprovalPolicy;

use crate::constants::{DEFAULT_RECEIPT_POLL_MS, DEFAULT_RELAY_POLL_MS};

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub receipt_poll_interval: Duration,
    pub relay_poll_interval: Duration,
    pub index_timeout: Option<Duration>,
    pub approval_policy: ApprovalPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_MS),
               relay_poll_interval: Duration::from_millis(DEFAULT_RELAY_POLL_MS),
               index_timeout: None,
               approval_policy: ApprovalPolicy::default() }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring invalid {}={:?}", name, raw);
            None
        }
    }
}

impl EngineConfig {
    /// Lee la configuración del entorno; valores ausentes o inválidos caen
    /// en los defaults.
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let defaults = Self::default();
        Self { receipt_poll_interval: parse_var("TXFLOW_RECEIPT_POLL_MS").map(Duration::from_millis)
                                                                         .unwrap_or(defaults.receipt_poll_interval),
               relay_poll_interval: parse_var("TXFLOW_RELAY_POLL_MS").map(Duration::from_millis)
                                                                     .unwrap_or(defaults.relay_poll_interval),
               index_timeout: parse_var("TXFLOW_INDEX_TIMEOUT_SECS").map(Duration::from_secs),
               approval_policy: parse_var("TXFLOW_APPROVAL_POLICY").unwrap_or(defaults.approval_policy) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let c = EngineConfig::default();
        assert_eq!(c.receipt_poll_interval, Duration::from_secs(1));
        assert_eq!(c.relay_poll_interval, Duration::from_secs(5));
        assert_eq!(c.index_timeout, None);
        assert_eq!(c.approval_policy, ApprovalPolicy::Exact);
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        env::set_var("TXFLOW_RELAY_POLL_MS", "250");
        env::set_var("TXFLOW_INDEX_TIMEOUT_SECS", "not-a-number");
        env::set_var("TXFLOW_APPROVAL_POLICY", "infinite");
        let c = EngineConfig::from_env();
        env::remove_var("TXFLOW_RELAY_POLL_MS");
        env::remove_var("TXFLOW_INDEX_TIMEOUT_SECS");
        env::remove_var("TXFLOW_APPROVAL_POLICY");
        assert_eq!(c.relay_poll_interval, Duration::from_millis(250));
        assert_eq!(c.index_timeout, None);
        assert_eq!(c.approval_policy, ApprovalPolicy::Infinite);
    }
}
