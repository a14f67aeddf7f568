//! Punto de entrada: request crudo → flujo + request validado.

use serde_json::Value;
use tx_core::{validate, FlowError, FlowRequest, RequestShape};

use crate::kind::FlowKind;

pub struct FlowRegistry;

impl FlowRegistry {
    pub fn kinds() -> &'static [FlowKind] {
        &FlowKind::ALL
    }

    pub fn shape(flow_id: &str) -> Result<RequestShape, FlowError> {
        Ok(flow_id.parse::<FlowKind>()?.definition().shape())
    }

    /// Lee `flowId`, elige la forma del flujo y corre el codec. Todos los
    /// problemas del payload se informan juntos.
    pub fn validate(raw: &Value) -> Result<(FlowKind, FlowRequest), FlowError> {
        let kind: FlowKind = match raw.get("flowId") {
            Some(Value::String(id)) => id.parse()?,
            Some(other) => return Err(FlowError::UnknownFlow(other.to_string())),
            None => return Err(FlowError::UnknownFlow("<missing flowId>".into())),
        };
        let request = validate(&kind.definition().shape(), raw)?;
        Ok((kind, request))
    }
}
