//! Apertura de posiciones con owner index.
//!
//! El índice por dueño lo propone la UI; si otra transacción pendiente lo
//! tomó primero, la wallet rechaza el envío con una firma de colisión y se
//! reintenta con el siguiente. Tras la confirmación se espera al índice de
//! lectura para obtener el id del trove y registrarlo en el estado local.

use alloy_primitives::U256;
use async_trait::async_trait;
use log::info;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tx_core::constants::SIGNAL_INDEX_COLLISION;
use tx_core::{retry_with_index, ContractCall, FlowCtx, FlowError, IndexError, Receipt, StepId, TxRef, TxStep};

use crate::KNOWN_TROVES_KEY;

/// Construye la llamada de apertura para un owner index dado.
pub(crate) trait TroveOpener: Send + Sync {
    fn display_name(&self, ctx: &FlowCtx<'_>) -> String;
    fn call(&self, ctx: &FlowCtx<'_>, owner_index: u64) -> Result<ContractCall, FlowError>;
}

pub(crate) struct OpenTroveStep<O> {
    id: &'static str,
    opener: O,
    used_index: Mutex<Option<u64>>,
}

impl<O> OpenTroveStep<O> {
    pub fn new(id: &'static str, opener: O) -> Self {
        Self { id,
               opener,
               used_index: Mutex::new(None) }
    }
}

#[async_trait]
impl<O: TroveOpener> TxStep for OpenTroveStep<O> {
    fn id(&self) -> StepId {
        StepId::from(self.id)
    }

    fn display_name(&self, ctx: &FlowCtx<'_>) -> String {
        self.opener.display_name(ctx)
    }

    async fn submit(&self, ctx: &FlowCtx<'_>) -> Result<TxRef, FlowError> {
        let start = ctx.request.index("ownerIndex")?;
        let is_collision = |e: &FlowError| {
            let hit = e.is_index_collision();
            if hit {
                ctx.signal(SIGNAL_INDEX_COLLISION, json!({ "error": e.to_string() }));
            }
            hit
        };
        let (index, tx) = retry_with_index(start, is_collision, |i| async move {
                              let call = self.opener.call(ctx, i)?;
                              ctx.write(&call).await.map(|tx| (i, tx))
                          }).await?;
        if index != start {
            info!("trove opened with owner index {} (requested {})", index, start);
        }
        *self.used_index.lock() = Some(index);
        Ok(tx)
    }

    async fn verify(&self, ctx: &FlowCtx<'_>, receipt: &Receipt) -> Result<(), FlowError> {
        let used_index = *self.used_index.lock();
        let index = used_index.ok_or_else(|| FlowError::Internal("trove verified before submission".into()))?;
        ctx.await_indexed(receipt.block_number).await?;
        let branch = ctx.request.branch("branchId")?;
        let owner = ctx.owner();
        let trove = ctx.account
                       .ports
                       .index
                       .find_trove(branch, owner, index)
                       .await?
                       .ok_or_else(|| {
                           IndexError::NotFound(format!("trove of {owner} with owner index {index} on branch {branch}"))
                       })?;
        let mut entry = Map::new();
        entry.insert(format!("{branch}:{trove}"),
                     json!({ "owner": owner, "ownerIndex": index, "txHash": receipt.tx_hash }));
        ctx.merge_local(KNOWN_TROVES_KEY, Value::Object(entry))
    }
}

/// Comisión máxima por defecto si el request no la fija: sin tope.
pub(crate) fn max_upfront_fee(ctx: &FlowCtx<'_>) -> Result<U256, FlowError> {
    Ok(ctx.request.opt_amount("maxUpfrontFee")?.unwrap_or(U256::MAX))
}
