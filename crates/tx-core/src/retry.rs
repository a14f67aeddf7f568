//! Reintento de envíos que reservan un owner index.
//!
//! Abrir una posición usa un índice por dueño que otra transacción pudo haber
//! tomado entre la planificación y la ejecución. El combinador reintenta con
//! el siguiente índice mientras el predicado marque el error como colisión.

use std::future::Future;

use log::info;

/// Llama `attempt(index)` empezando en `start`. Un error que `is_retryable`
/// acepta incrementa el índice y reintenta; cualquier otro error se propaga.
/// No tiene cota de intentos.
pub async fn retry_with_index<T, E, F, Fut, P>(start: u64, is_retryable: P, mut attempt: F) -> Result<T, E>
    where F: FnMut(u64) -> Fut,
          Fut: Future<Output = Result<T, E>>,
          P: Fn(&E) -> bool
{
    let mut index = start;
    loop {
        match attempt(index).await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) => match index.checked_add(1) {
                Some(next) => {
                    info!("owner index collision index={} retry_with={}", index, next);
                    index = next;
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}
