use thiserror::Error;
use tx_core::{FlowError, FlowFailure};

/// Errores de la fachada y del binario.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Failed(#[from] FlowFailure),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Error del flujo, haya fallado antes o durante la ejecución.
    pub fn flow_error(&self) -> Option<&FlowError> {
        match self {
            AppError::Flow(e) => Some(e),
            AppError::Failed(f) => Some(&f.error),
            _ => None,
        }
    }
}
