//! Tabla de direcciones de contratos del despliegue.
//!
//! Se carga una vez (normalmente desde JSON) y se comparte de sólo lectura con
//! todos los pasos de un run.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{BranchId, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchContracts {
    pub id: BranchId,
    pub symbol: String,
    /// El colateral se envía como valor nativo (sin aprobación ERC20).
    pub native: bool,
    pub coll_token: Address,
    pub borrower_operations: Address,
    pub trove_manager: Address,
    pub stability_pool: Address,
    pub coll_surplus_pool: Address,
    pub zapper: Address,
    pub leverage_zapper: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contracts {
    pub bold_token: Address,
    pub collateral_registry: Address,
    pub governance: Address,
    pub lqty_token: Address,
    pub sbold: Address,
    pub multisend: Address,
    pub branches: Vec<BranchContracts>,
}

impl Contracts {
    pub fn branch(&self, id: BranchId) -> Result<&BranchContracts, DomainError> {
        self.branches
            .iter()
            .find(|b| b.id == id)
            .ok_or(DomainError::UnknownBranch(id))
    }

    pub fn branch_ids(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.branches.iter().map(|b| b.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(id: u8) -> BranchContracts {
        BranchContracts { id: BranchId::new(id),
                          symbol: format!("COLL{id}"),
                          native: id == 0,
                          coll_token: Address::repeat_byte(0x10 + id),
                          borrower_operations: Address::repeat_byte(0x20 + id),
                          trove_manager: Address::repeat_byte(0x30 + id),
                          stability_pool: Address::repeat_byte(0x40 + id),
                          coll_surplus_pool: Address::repeat_byte(0x50 + id),
                          zapper: Address::repeat_byte(0x60 + id),
                          leverage_zapper: Address::repeat_byte(0x70 + id) }
    }

    #[test]
    fn branch_lookup() {
        let c = Contracts { bold_token: Address::repeat_byte(1),
                            collateral_registry: Address::repeat_byte(2),
                            governance: Address::repeat_byte(3),
                            lqty_token: Address::repeat_byte(4),
                            sbold: Address::repeat_byte(5),
                            multisend: Address::repeat_byte(6),
                            branches: vec![branch(0), branch(1)] };
        assert_eq!(c.branch(BranchId::new(1)).unwrap().symbol, "COLL1");
        assert_eq!(c.branch(BranchId::new(9)), Err(DomainError::UnknownBranch(BranchId::new(9))));
        assert_eq!(c.branch_ids().count(), 2);
    }

    #[test]
    fn deserializes_camel_case_json() {
        let json = serde_json::to_value(branch(2)).unwrap();
        assert!(json.get("borrowerOperations").is_some());
        let back: BranchContracts = serde_json::from_value(json).unwrap();
        assert_eq!(back, branch(2));
    }
}
