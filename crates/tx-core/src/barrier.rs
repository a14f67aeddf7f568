//! Barrera de consistencia con el índice de lectura.
//!
//! Tras confirmar una transacción, el índice (subgraph) puede ir por detrás
//! de la cadena. La barrera consulta la altura indexada hasta alcanzar el
//! bloque del recibo, con backoff exponencial `2^min(intento, 4)` segundos.
//! Los errores de consulta cuentan como atraso.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::chain::ReadIndex;
use crate::constants::INDEX_BACKOFF_MAX_EXPONENT;
use crate::errors::FlowError;
use crate::wait::{or_cancel, sleep_or_cancel};

/// Una consulta que encontró el índice atrasado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLag {
    pub target: u64,
    /// `None` si la consulta falló.
    pub seen: Option<u64>,
    pub attempt: u32,
    pub next_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierReport {
    pub target: u64,
    pub reached: u64,
    pub polls: u32,
    pub waited: Duration,
}

/// Demora antes del reintento `attempt` (0-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(INDEX_BACKOFF_MAX_EXPONENT))
}

pub struct ConsistencyBarrier {
    index: Arc<dyn ReadIndex>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl ConsistencyBarrier {
    pub fn new(index: Arc<dyn ReadIndex>) -> Self {
        Self { index,
               timeout: None,
               cancel: CancellationToken::new() }
    }

    /// Límite total opcional; sin él la barrera espera indefinidamente.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn await_indexed(&self, block: u64) -> Result<BarrierReport, FlowError> {
        self.await_indexed_with(block, |_| {}).await
    }

    /// Igual que `await_indexed`, invocando `on_lag` en cada consulta atrasada.
    pub async fn await_indexed_with<F>(&self, block: u64, mut on_lag: F) -> Result<BarrierReport, FlowError>
        where F: FnMut(&IndexLag) + Send
    {
        let mut last_seen = None;
        let outcome = match self.timeout {
            Some(limit) => {
                let polling = self.poll(block, &mut last_seen, &mut on_lag);
                tokio::time::timeout(limit, polling).await.ok()
            }
            None => Some(self.poll(block, &mut last_seen, &mut on_lag).await),
        };
        match outcome {
            Some(result) => result,
            None => {
                warn!("index timeout target={} last_seen={:?}", block, last_seen);
                Err(FlowError::IndexTimeout { target: block,
                                              last_seen })
            }
        }
    }

    async fn poll<F>(&self, block: u64, last_seen: &mut Option<u64>, on_lag: &mut F)
                     -> Result<BarrierReport, FlowError>
        where F: FnMut(&IndexLag) + Send
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let head = or_cancel(&self.cancel, async { Ok(self.index.indexed_block_number().await) }).await?;
            let seen = match head {
                Ok(n) => {
                    *last_seen = Some(n);
                    Some(n)
                }
                Err(e) => {
                    warn!("index query failed target={} attempt={} err={}", block, attempt, e);
                    None
                }
            };
            if let Some(n) = seen.filter(|n| *n >= block) {
                debug!("index reached target={} head={} polls={}", block, n, attempt + 1);
                return Ok(BarrierReport { target: block,
                                          reached: n,
                                          polls: attempt + 1,
                                          waited: started.elapsed() });
            }
            let next_delay = backoff_delay(attempt);
            debug!("index lagging target={} seen={:?} retry_in={:?}", block, seen, next_delay);
            on_lag(&IndexLag { target: block,
                               seen,
                               attempt,
                               next_delay });
            sleep_or_cancel(next_delay, &self.cancel).await?;
            attempt = attempt.saturating_add(1);
        }
    }
}
