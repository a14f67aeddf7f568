use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::errors::FlowError;

/// Valor ABI simplificado usado como argumento y como resultado de lecturas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CallValue {
    Uint(U256),
    Address(Address),
    Bool(bool),
    List(Vec<CallValue>),
    /// Llamada anidada (p.ej. cada elemento de un `multiDelegateCall`).
    Call(Box<ContractCall>),
}

impl CallValue {
    pub fn as_uint(&self) -> Result<U256, FlowError> {
        match self {
            CallValue::Uint(v) => Ok(*v),
            other => Err(FlowError::Decode(format!("expected uint, got {other:?}"))),
        }
    }

    pub fn as_address(&self) -> Result<Address, FlowError> {
        match self {
            CallValue::Address(a) => Ok(*a),
            other => Err(FlowError::Decode(format!("expected address, got {other:?}"))),
        }
    }

    pub fn as_bool(&self) -> Result<bool, FlowError> {
        match self {
            CallValue::Bool(b) => Ok(*b),
            other => Err(FlowError::Decode(format!("expected bool, got {other:?}"))),
        }
    }

    pub fn as_list(&self) -> Result<&[CallValue], FlowError> {
        match self {
            CallValue::List(items) => Ok(items),
            other => Err(FlowError::Decode(format!("expected tuple/list, got {other:?}"))),
        }
    }

    pub fn as_call(&self) -> Result<&ContractCall, FlowError> {
        match self {
            CallValue::Call(c) => Ok(c),
            other => Err(FlowError::Decode(format!("expected nested call, got {other:?}"))),
        }
    }

    /// Elemento `i` de una tupla.
    pub fn at(&self, i: usize) -> Result<&CallValue, FlowError> {
        self.as_list()?
            .get(i)
            .ok_or_else(|| FlowError::Decode(format!("tuple has no element {i}")))
    }

    pub fn uints(values: impl IntoIterator<Item = U256>) -> Self {
        CallValue::List(values.into_iter().map(CallValue::Uint).collect())
    }

    pub fn addresses(values: impl IntoIterator<Item = Address>) -> Self {
        CallValue::List(values.into_iter().map(CallValue::Address).collect())
    }
}

impl From<U256> for CallValue {
    fn from(v: U256) -> Self {
        CallValue::Uint(v)
    }
}

impl From<u64> for CallValue {
    fn from(v: u64) -> Self {
        CallValue::Uint(U256::from(v))
    }
}

impl From<Address> for CallValue {
    fn from(v: Address) -> Self {
        CallValue::Address(v)
    }
}

impl From<ContractCall> for CallValue {
    fn from(v: ContractCall) -> Self {
        CallValue::Call(Box::new(v))
    }
}

impl From<bool> for CallValue {
    fn from(v: bool) -> Self {
        CallValue::Bool(v)
    }
}

/// Descriptor de llamada a contrato: dirección, función, argumentos y valor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractCall {
    pub to: Address,
    pub function: String,
    pub args: Vec<CallValue>,
    pub value: U256,
}

impl ContractCall {
    pub fn new(to: Address, function: impl Into<String>, args: Vec<CallValue>) -> Self {
        Self { to,
               function: function.into(),
               args,
               value: U256::ZERO }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.function, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawOperation {
    Call,
    DelegateCall,
}

/// Transacción "cruda" enviada sin pasar por `write_contract`: se usa para
/// agrupar varias llamadas en un único envío (MultiSend). La codificación
/// final es responsabilidad de la wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub to: Address,
    pub value: U256,
    pub operation: RawOperation,
    pub calls: Vec<ContractCall>,
}

impl RawTransaction {
    pub fn multisend(multisend: Address, calls: Vec<ContractCall>) -> Self {
        let value = calls.iter().fold(U256::ZERO, |acc, c| acc.saturating_add(c.value));
        Self { to: multisend,
               value,
               operation: RawOperation::DelegateCall,
               calls }
    }
}
