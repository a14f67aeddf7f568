//! Espera de confirmación durable.
//!
//! Camino directo: se consulta el recibo hasta que el nodo lo reporte minado,
//! revertido o descartado. Camino relay (multisig): primero se espera a que
//! la propuesta junte firmas y se ejecute, y luego se sigue el camino
//! directo con el hash on-chain. Ambos devuelven el mismo `Receipt`.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::chain::{ReceiptSource, Relay};
use crate::config::EngineConfig;
use crate::errors::FlowError;
use crate::model::{ExecutionPath, Receipt, ReceiptStatus, RelayStatus, TxRef};
use crate::wait::{or_cancel, sleep_or_cancel};

pub struct ConfirmationWaiter {
    receipts: Arc<dyn ReceiptSource>,
    relay: Option<Arc<dyn Relay>>,
    receipt_poll: Duration,
    relay_poll: Duration,
    cancel: CancellationToken,
}

impl ConfirmationWaiter {
    pub fn new(receipts: Arc<dyn ReceiptSource>, config: &EngineConfig) -> Self {
        Self { receipts,
               relay: None,
               receipt_poll: config.receipt_poll_interval,
               relay_poll: config.relay_poll_interval,
               cancel: CancellationToken::new() }
    }

    pub fn with_relay(mut self, relay: Option<Arc<dyn Relay>>) -> Self {
        self.relay = relay;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn wait(&self, tx: TxRef) -> Result<Receipt, FlowError> {
        match tx.path {
            ExecutionPath::Direct => self.wait_direct(tx.hash).await,
            ExecutionPath::Relayed => {
                let executed = self.wait_relayed(tx.hash).await?;
                self.wait_direct(executed).await
            }
        }
    }

    async fn wait_direct(&self, hash: B256) -> Result<Receipt, FlowError> {
        loop {
            let status = or_cancel(&self.cancel, async { Ok(self.receipts.transaction_receipt(hash).await) }).await?;
            match status {
                Ok(ReceiptStatus::Mined(receipt)) => {
                    debug!("tx mined hash={} block={}", hash, receipt.block_number);
                    return Ok(receipt);
                }
                Ok(ReceiptStatus::Reverted { receipt, reason }) => {
                    warn!("tx reverted hash={} block={} reason={:?}", hash, receipt.block_number, reason);
                    return Err(FlowError::TxReverted { tx_hash: hash,
                                                       reason });
                }
                Ok(ReceiptStatus::Dropped) => {
                    warn!("tx dropped hash={}", hash);
                    return Err(FlowError::TxDropped { tx_hash: hash });
                }
                Ok(ReceiptStatus::Pending) => debug!("tx pending hash={}", hash),
                // el nodo es la autoridad sobre el fallo: errores de transporte se reintentan
                Err(e) => warn!("receipt query failed hash={} err={}", hash, e),
            }
            sleep_or_cancel(self.receipt_poll, &self.cancel).await?;
        }
    }

    /// Devuelve el hash on-chain de la propuesta una vez ejecutada.
    async fn wait_relayed(&self, safe_tx_hash: B256) -> Result<B256, FlowError> {
        let relay = self.relay
                        .as_ref()
                        .ok_or_else(|| FlowError::Internal("relayed transaction without a relay".into()))?;
        loop {
            let status = or_cancel(&self.cancel, async { Ok(relay.relay_status(safe_tx_hash).await) }).await?;
            match status {
                Ok(RelayStatus::Executed { tx_hash }) => {
                    info!("relay executed safe_tx={} tx={}", safe_tx_hash, tx_hash);
                    return Ok(tx_hash);
                }
                Ok(RelayStatus::Rejected { reason }) => {
                    warn!("relay rejected safe_tx={} reason={:?}", safe_tx_hash, reason);
                    return Err(FlowError::TxDropped { tx_hash: safe_tx_hash });
                }
                Ok(RelayStatus::AwaitingSignatures { confirmations,
                                                     threshold, }) => {
                    debug!("relay awaiting signatures safe_tx={} {}/{}", safe_tx_hash, confirmations, threshold)
                }
                Err(e) => warn!("relay query failed safe_tx={} err={}", safe_tx_hash, e),
            }
            sleep_or_cancel(self.relay_poll, &self.cancel).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::ChainError;

    struct Script<T> {
        items: Mutex<VecDeque<Result<T, ChainError>>>,
        calls: Mutex<u32>,
    }

    impl<T: Clone> Script<T> {
        fn new(items: Vec<Result<T, ChainError>>) -> Arc<Self> {
            Arc::new(Self { items: Mutex::new(items.into()),
                            calls: Mutex::new(0) })
        }

        fn next(&self) -> Result<T, ChainError> {
            *self.calls.lock().unwrap() += 1;
            let mut items = self.items.lock().unwrap();
            if items.len() > 1 {
                items.pop_front().unwrap()
            } else {
                items.front().cloned().unwrap()
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ReceiptSource for Script<ReceiptStatus> {
        async fn transaction_receipt(&self, _hash: B256) -> Result<ReceiptStatus, ChainError> {
            self.next()
        }
    }

    #[async_trait]
    impl Relay for Script<RelayStatus> {
        async fn relay_status(&self, _hash: B256) -> Result<RelayStatus, ChainError> {
            self.next()
        }
    }

    fn mined(block: u64) -> ReceiptStatus {
        ReceiptStatus::Mined(Receipt { tx_hash: B256::repeat_byte(0xee),
                                       block_number: block })
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn direct_path_polls_through_pending_and_transport_errors() {
        let receipts = Script::new(vec![Ok(ReceiptStatus::Pending),
                                        Err(ChainError::Transport("timeout".into())),
                                        Ok(mined(12))]);
        let waiter = ConfirmationWaiter::new(receipts.clone(), &config());
        let receipt = waiter.wait(TxRef::direct(B256::repeat_byte(1))).await.unwrap();
        assert_eq!(receipt.block_number, 12);
        assert_eq!(receipts.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn revert_and_drop_are_terminal() {
        let hash = B256::repeat_byte(2);
        let reverted = Script::new(vec![Ok(ReceiptStatus::Reverted { receipt: Receipt { tx_hash: hash,
                                                                                          block_number: 3 },
                                                                       reason: Some("Insufficient".into()) })]);
        let err = ConfirmationWaiter::new(reverted, &config()).wait(TxRef::direct(hash))
                                                              .await
                                                              .unwrap_err();
        assert_eq!(err, FlowError::TxReverted { tx_hash: hash,
                                                reason: Some("Insufficient".into()) });

        let dropped = Script::new(vec![Ok(ReceiptStatus::Pending), Ok(ReceiptStatus::Dropped)]);
        let err = ConfirmationWaiter::new(dropped, &config()).wait(TxRef::direct(hash))
                                                             .await
                                                             .unwrap_err();
        assert_eq!(err, FlowError::TxDropped { tx_hash: hash });
    }

    #[tokio::test(start_paused = true)]
    async fn relayed_path_resolves_to_the_same_receipt_shape() {
        let executed = B256::repeat_byte(0xee);
        let relay = Script::new(vec![Ok(RelayStatus::AwaitingSignatures { confirmations: 1,
                                                                          threshold: 2 }),
                                     Ok(RelayStatus::Executed { tx_hash: executed })]);
        let receipts = Script::new(vec![Ok(mined(40))]);
        let waiter = ConfirmationWaiter::new(receipts, &config()).with_relay(Some(relay.clone() as Arc<dyn Relay>));
        let receipt = waiter.wait(TxRef::relayed(B256::repeat_byte(9))).await.unwrap();
        assert_eq!(receipt, Receipt { tx_hash: executed,
                                      block_number: 40 });
        assert_eq!(relay.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn relayed_without_relay_is_an_internal_error() {
        let receipts = Script::new(vec![Ok(mined(1))]);
        let err = ConfirmationWaiter::new(receipts, &config()).wait(TxRef::relayed(B256::ZERO))
                                                              .await
                                                              .unwrap_err();
        assert!(matches!(err, FlowError::Internal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_polling() {
        let receipts = Script::new(vec![Ok(ReceiptStatus::Pending)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = ConfirmationWaiter::new(receipts, &config()).with_cancel(cancel)
                                                              .wait(TxRef::direct(B256::ZERO))
                                                              .await
                                                              .unwrap_err();
        assert_eq!(err, FlowError::Cancelled);
    }

    /// Fuente cuya consulta nunca responde.
    struct Hung;

    #[async_trait]
    impl ReceiptSource for Hung {
        async fn transaction_receipt(&self, _hash: B256) -> Result<ReceiptStatus, ChainError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl Relay for Hung {
        async fn relay_status(&self, _hash: B256) -> Result<RelayStatus, ChainError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn cancel_interrupts_a_hung_receipt_query() {
        let cancel = CancellationToken::new();
        let waiter = ConfirmationWaiter::new(Arc::new(Hung), &config()).with_cancel(cancel.clone());
        cancel.cancel();
        let out = tokio::time::timeout(Duration::from_secs(2), waiter.wait(TxRef::direct(B256::ZERO))).await;
        assert_eq!(out, Ok(Err(FlowError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_interrupts_a_hung_relay_query() {
        let cancel = CancellationToken::new();
        let waiter = ConfirmationWaiter::new(Arc::new(Hung), &config()).with_relay(Some(Arc::new(Hung) as Arc<dyn Relay>))
                                                                        .with_cancel(cancel.clone());
        let handle = tokio::spawn(async move { waiter.wait(TxRef::relayed(B256::ZERO)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), Err(FlowError::Cancelled));
    }
}
