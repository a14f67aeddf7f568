use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::FlowError;

/// Duerme `duration` salvo que el token se cancele antes.
pub(crate) async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<(), FlowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Ejecuta `fut` abandonándolo si el token se cancela. Lo ya enviado a la
/// cadena sigue su curso; sólo se deja de esperar.
pub(crate) async fn or_cancel<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, FlowError>
    where F: Future<Output = Result<T, FlowError>>
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        out = fut => out,
    }
}
