//! Errores del motor.
//!
//! Los errores de cadena, índice y wallet no se ocultan: se adjuntan tal cual
//! al estado `Failed` del paso para que la UI pueda mostrar el diagnóstico
//! del proveedor.

use std::fmt;
use std::path::PathBuf;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tx_domain::DomainError;
use uuid::Uuid;

use crate::constants::INDEX_COLLISION_REASONS;
use crate::flow::FlowRun;
use crate::step::StepId;

/// Errores reportados por la wallet o el nodo.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("execution reverted: {}", .reason.as_deref().unwrap_or("no reason"))]
    Reverted { reason: Option<String> },
    #[error("transport: {0}")]
    Transport(String),
}

impl ChainError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::Reverted { reason: Some(reason.into()) }
    }

    /// El revert corresponde a un owner index ya usado por otra posición.
    pub fn is_index_collision(&self) -> bool {
        match self {
            ChainError::Reverted { reason: Some(r) } => INDEX_COLLISION_REASONS.iter().any(|sig| r.contains(sig)),
            _ => false,
        }
    }
}

/// Errores del índice de lectura (indexer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("read index unavailable: {0}")]
    Unavailable(String),
    #[error("not indexed: {0}")]
    NotFound(String),
}

/// Errores del almacenamiento local durable.
#[derive(Debug, Error)]
pub enum LocalStateError {
    #[error("local state io at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("local state at {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("local state at {} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),
    #[error("local state encode: {0}")]
    Encode(#[from] serde_json::Error),
}

impl LocalStateError {
    /// El archivo existe pero su contenido no se puede usar.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, LocalStateError::Parse { .. } | LocalStateError::NotAnObject(_))
    }
}

/// Problema puntual encontrado al validar un request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

/// Error agregado del codec: todos los problemas de un request juntos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub flow: String,
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid `{}` request", self.flow)?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", issue.path, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("signature rejected by the user")]
    SignatureRejected,
    #[error("chain error: {0}")]
    Chain(ChainError),
    #[error("transaction {tx_hash} reverted: {}", .reason.as_deref().unwrap_or("no reason"))]
    TxReverted { tx_hash: B256, reason: Option<String> },
    #[error("transaction {tx_hash} dropped")]
    TxDropped { tx_hash: B256 },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("read index did not reach block {target} in time (last seen {last_seen:?})")]
    IndexTimeout { target: u64, last_seen: Option<u64> },
    #[error("{0}")]
    DegradedRead(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("nothing to do")]
    NothingToDo,
    #[error("unknown flow: {0}")]
    UnknownFlow(String),
    #[error("request for `{got}` handed to flow `{expected}`")]
    FlowMismatch { expected: String, got: String },
    #[error("unknown step: {0}")]
    UnknownStep(String),
    #[error("invalid step transition {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("unexpected call value: {0}")]
    Decode(String),
    #[error("local state: {0}")]
    LocalState(String),
    #[error("cancelled")]
    Cancelled,
    #[error("internal: {0}")]
    Internal(String),
}

impl From<ChainError> for FlowError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::UserRejected => FlowError::SignatureRejected,
            other => FlowError::Chain(other),
        }
    }
}

impl FlowError {
    pub fn is_index_collision(&self) -> bool {
        matches!(self, FlowError::Chain(e) if e.is_index_collision())
    }
}

/// Run terminado en `Failed`: conserva el run (estados incluidos), el paso
/// que falló (ninguno si falló la planificación) y el error original.
#[derive(Debug, Error)]
#[error("flow {flow_id} failed at {}: {error}", .failed_step.as_ref().map(|s| s.as_str()).unwrap_or("planning"))]
pub struct FlowFailure {
    pub flow_id: Uuid,
    pub failed_step: Option<StepId>,
    pub error: FlowError,
    pub run: Box<FlowRun>,
}
