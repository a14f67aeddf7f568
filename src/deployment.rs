//! Tabla de contratos del despliegue.

use std::fs;
use std::path::Path;

use log::info;
use tx_domain::Contracts;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Lee la tabla de contratos de un archivo JSON (claves camelCase).
pub fn load_contracts(path: &Path) -> Result<Contracts, AppError> {
    let raw = fs::read_to_string(path)?;
    let contracts: Contracts = serde_json::from_str(&raw)?;
    if contracts.branches.is_empty() {
        return Err(AppError::Config(format!("{} declares no collateral branches", path.display())));
    }
    info!("contracts loaded path={} branches={}", path.display(), contracts.branches.len());
    Ok(contracts)
}

/// Tabla de contratos indicada por `TXFLOW_CONTRACTS_PATH`.
pub fn from_config(config: &AppConfig) -> Result<Contracts, AppError> {
    let path = config.contracts_path
                     .as_deref()
                     .ok_or_else(|| AppError::Config("TXFLOW_CONTRACTS_PATH not set".into()))?;
    load_contracts(path)
}
