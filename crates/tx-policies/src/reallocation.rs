use alloy_primitives::{Address, U256};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use tx_domain::{DomainError, VoteAllocation, VoteDirection};

/// Escala de las proporciones (punto fijo 1e18).
pub const SHARE_PRECISION: u64 = 1_000_000_000_000_000_000;

/// Monto reasignado a un destinatario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reallocation {
    pub amount: U256,
    pub direction: VoteDirection,
}

struct Weighted {
    recipient: Address,
    share: U256,
    direction: VoteDirection,
}

fn overflow(what: &str) -> DomainError {
    DomainError::Overflow(format!("reallocation: {what}"))
}

/// Funde entradas repetidas del mismo destinatario conservando la posición
/// de la primera aparición.
fn merge_recipients(allocations: &[VoteAllocation]) -> Result<Vec<VoteAllocation>, DomainError> {
    let mut merged: IndexMap<Address, VoteAllocation> = IndexMap::with_capacity(allocations.len());
    for a in allocations {
        match merged.get_mut(&a.recipient) {
            Some(acc) => {
                acc.for_amount = acc.for_amount.checked_add(a.for_amount).ok_or_else(|| overflow("for amount"))?;
                acc.against_amount =
                    acc.against_amount.checked_add(a.against_amount).ok_or_else(|| overflow("against amount"))?;
            }
            None => {
                merged.insert(a.recipient, *a);
            }
        }
    }
    Ok(merged.into_values().collect())
}

/// Reparte `remaining_stake` entre los destinatarios con asignación previa,
/// en proporción a su asignación total.
///
/// Las entradas se procesan por proporción descendente (empates en el orden
/// de entrada) y el divisor se achica tras cada una, de modo que la última
/// absorbe el error de truncamiento: la suma de los montos es exactamente
/// `remaining_stake`. El mapa conserva el orden de procesamiento. Sin
/// asignaciones (o con total cero) el resultado es vacío.
pub fn reallocate(allocations: &[VoteAllocation], remaining_stake: U256)
                  -> Result<IndexMap<Address, Reallocation>, DomainError> {
    let allocations = merge_recipients(allocations)?;
    let total = allocations.iter().try_fold(U256::ZERO, |acc, a| {
                                       acc.checked_add(a.for_amount)
                                          .and_then(|v| v.checked_add(a.against_amount))
                                          .ok_or_else(|| overflow("total allocated"))
                                   })?;
    if total.is_zero() {
        return Ok(IndexMap::new());
    }

    let precision = U256::from(SHARE_PRECISION);
    let mut weighted = Vec::with_capacity(allocations.len());
    for a in &allocations {
        let votes = a.for_amount + a.against_amount;
        let share = votes.checked_mul(precision).ok_or_else(|| overflow("share"))? / total;
        if share.is_zero() {
            continue;
        }
        weighted.push(Weighted { recipient: a.recipient,
                                 share,
                                 direction: a.direction() });
    }
    // sort_by es estable: los empates quedan en orden de entrada
    weighted.sort_by(|a, b| b.share.cmp(&a.share));

    let mut remaining_lqty = remaining_stake;
    let mut remaining_share = weighted.iter().fold(U256::ZERO, |acc, w| acc + w.share);
    let mut out = IndexMap::with_capacity(weighted.len());
    for w in weighted {
        let amount = remaining_lqty.checked_mul(w.share).ok_or_else(|| overflow("amount"))? / remaining_share;
        remaining_lqty -= amount;
        remaining_share -= w.share;
        out.insert(w.recipient,
                   Reallocation { amount,
                                  direction: w.direction });
    }
    debug!("reallocated stake={} recipients={} residual={}", remaining_stake, out.len(), remaining_lqty);
    Ok(out)
}
