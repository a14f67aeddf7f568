//! Constantes del motor.

/// Versión lógica del motor. Forma parte del `plan_hash` de cada run para que
/// un cambio incompatible en la planificación produzca hashes distintos.
pub const ENGINE_VERSION: &str = "TX1.0";

/// Intervalo por defecto entre consultas de recibo (camino directo).
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Intervalo por defecto entre consultas al relay (multisig).
pub const DEFAULT_RELAY_POLL_MS: u64 = 5_000;

/// Exponente máximo del backoff del índice: `2^4 = 16` segundos.
pub const INDEX_BACKOFF_MAX_EXPONENT: u32 = 4;

/// Señal emitida mientras el índice de lectura no alcanza el bloque esperado.
pub const SIGNAL_INDEX_LAGGING: &str = "index_lagging";

/// Señal emitida cuando un owner index ya está en uso y se reintenta.
pub const SIGNAL_INDEX_COLLISION: &str = "index_collision";

/// Razones de revert que indican colisión de owner index.
pub const INDEX_COLLISION_REASONS: &[&str] = &["TroveExists", "owner index already used"];
