use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::Serialize;
use tx_domain::{BranchId, Dnum};

use crate::errors::FlowError;

/// Valor normalizado de un campo del request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    Dnum(Dnum),
    Address(Address),
    Uint(U256),
    Bool(bool),
    Enum(String),
    Array(Vec<FieldValue>),
    Record(BTreeMap<String, FieldValue>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub path: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub back_link: Option<Link>,
    pub success_link: Link,
    pub success_message: String,
}

/// Request validado y normalizado. Sólo lo construye el codec; el motor lo
/// comparte detrás de un `Arc` y nunca lo modifica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowRequest {
    flow: String,
    fields: BTreeMap<String, FieldValue>,
    navigation: Navigation,
}

impl FlowRequest {
    pub(crate) fn new(flow: String, fields: BTreeMap<String, FieldValue>, navigation: Navigation) -> Self {
        Self { flow,
               fields,
               navigation }
    }

    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&FieldValue, FlowError> {
        self.fields
            .get(name)
            .ok_or_else(|| FlowError::Decode(format!("`{}` has no field `{name}`", self.flow)))
    }

    fn mismatch(&self, name: &str, expected: &str) -> FlowError {
        FlowError::Decode(format!("`{}.{name}` is not {expected}", self.flow))
    }

    pub fn dnum(&self, name: &str) -> Result<Dnum, FlowError> {
        match self.require(name)? {
            FieldValue::Dnum(d) => Ok(*d),
            _ => Err(self.mismatch(name, "an amount")),
        }
    }

    /// Monto en 18 decimales (el codec ya normalizó).
    pub fn amount(&self, name: &str) -> Result<U256, FlowError> {
        Ok(self.dnum(name)?.to_wad()?)
    }

    pub fn opt_amount(&self, name: &str) -> Result<Option<U256>, FlowError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(_) => self.amount(name).map(Some),
        }
    }

    pub fn address(&self, name: &str) -> Result<Address, FlowError> {
        match self.require(name)? {
            FieldValue::Address(a) => Ok(*a),
            _ => Err(self.mismatch(name, "an address")),
        }
    }

    pub fn opt_address(&self, name: &str) -> Result<Option<Address>, FlowError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(_) => self.address(name).map(Some),
        }
    }

    pub fn uint(&self, name: &str) -> Result<U256, FlowError> {
        match self.require(name)? {
            FieldValue::Uint(v) => Ok(*v),
            _ => Err(self.mismatch(name, "an unsigned integer")),
        }
    }

    /// Entero que debe caber en 64 bits (owner index, ids pequeños).
    pub fn index(&self, name: &str) -> Result<u64, FlowError> {
        let v = self.uint(name)?;
        u64::try_from(v).map_err(|_| self.mismatch(name, "a 64-bit integer"))
    }

    pub fn branch(&self, name: &str) -> Result<BranchId, FlowError> {
        let v = self.uint(name)?;
        u8::try_from(v).map(BranchId::new)
                       .map_err(|_| self.mismatch(name, "a branch id"))
    }

    /// Booleano opcional; ausente equivale a `false`.
    pub fn flag(&self, name: &str) -> Result<bool, FlowError> {
        match self.fields.get(name) {
            None => Ok(false),
            Some(FieldValue::Bool(b)) => Ok(*b),
            Some(_) => Err(self.mismatch(name, "a boolean")),
        }
    }

    pub fn choice(&self, name: &str) -> Result<&str, FlowError> {
        match self.require(name)? {
            FieldValue::Enum(s) => Ok(s),
            _ => Err(self.mismatch(name, "one of the declared variants")),
        }
    }

    pub fn list(&self, name: &str) -> Result<&[FieldValue], FlowError> {
        match self.require(name)? {
            FieldValue::Array(items) => Ok(items),
            _ => Err(self.mismatch(name, "a list")),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl FieldValue {
    pub fn as_record(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            FieldValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_dnum(&self) -> Option<Dnum> {
        match self {
            FieldValue::Dnum(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            FieldValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
