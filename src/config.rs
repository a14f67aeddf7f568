//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone una estructura
//! inmutable (`CONFIG`).
use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use tx_core::EngineConfig;

/// Configuración global: la del motor más las rutas del binario.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Archivo JSON del estado local durable (`TXFLOW_LOCAL_STATE_PATH`).
    /// Sin valor, el estado local vive en memoria.
    pub local_state_path: Option<PathBuf>,
    /// Tabla de contratos del despliegue (`TXFLOW_CONTRACTS_PATH`).
    pub contracts_path: Option<PathBuf>,
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let engine = EngineConfig::from_env();
        Self { engine,
               local_state_path: path_var("TXFLOW_LOCAL_STATE_PATH"),
               contracts_path: path_var("TXFLOW_CONTRACTS_PATH") }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
