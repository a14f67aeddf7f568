use std::collections::BTreeMap;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde_json::{Map, Value};
use tx_domain::Dnum;

use super::shape::{FieldSpec, FieldType, Refinement, RequestShape};
use crate::errors::{FieldIssue, ValidationError};
use crate::model::{FieldValue, FlowRequest, Link, Navigation};

const ENVELOPE_KEYS: &[&str] = &["flowId", "fields", "navigation"];

struct Issues {
    list: Vec<FieldIssue>,
}

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.list.push(FieldIssue { path: path.into(),
                                    message: message.into() });
    }
}

/// Valida `raw` contra `shape`. Sin efectos laterales.
pub fn validate(shape: &RequestShape, raw: &Value) -> Result<FlowRequest, ValidationError> {
    let mut issues = Issues { list: Vec::new() };
    let Some(obj) = raw.as_object() else {
        issues.push("$", "expected an object");
        return Err(ValidationError { flow: shape.flow.to_string(),
                                     issues: issues.list });
    };

    for key in obj.keys() {
        if !ENVELOPE_KEYS.contains(&key.as_str()) {
            issues.push(key.clone(), "unknown field");
        }
    }

    match obj.get("flowId") {
        Some(Value::String(id)) if id == shape.flow => {}
        Some(Value::String(id)) => issues.push("flowId", format!("expected `{}`, got `{id}`", shape.flow)),
        Some(_) => issues.push("flowId", "expected a string"),
        None => issues.push("flowId", "required"),
    }

    let fields = match obj.get("fields") {
        Some(Value::Object(map)) => decode_record(&shape.fields, map, "fields", &mut issues),
        Some(_) => {
            issues.push("fields", "expected an object");
            BTreeMap::new()
        }
        None if shape.fields.iter().all(|f| !f.required) => BTreeMap::new(),
        None => {
            issues.push("fields", "required");
            BTreeMap::new()
        }
    };

    let navigation = match obj.get("navigation") {
        Some(nav) => decode_navigation(nav, &mut issues),
        None => {
            issues.push("navigation", "required");
            None
        }
    };

    match navigation {
        Some(navigation) if issues.list.is_empty() => {
            Ok(FlowRequest::new(shape.flow.to_string(), fields, navigation))
        }
        _ => Err(ValidationError { flow: shape.flow.to_string(),
                                   issues: issues.list }),
    }
}

fn decode_record(specs: &[FieldSpec], map: &Map<String, Value>, path: &str, issues: &mut Issues)
                 -> BTreeMap<String, FieldValue> {
    let mut out = BTreeMap::new();
    for key in map.keys() {
        if !specs.iter().any(|s| s.name == key) {
            issues.push(format!("{path}.{key}"), "unknown field");
        }
    }
    for spec in specs {
        let field_path = format!("{path}.{}", spec.name);
        match map.get(spec.name) {
            None | Some(Value::Null) if spec.required => issues.push(field_path, "required"),
            None | Some(Value::Null) => {}
            Some(raw) => {
                if let Some(value) = decode_value(&spec.ty, raw, &field_path, issues) {
                    if spec.refinement == Some(Refinement::Positive) && is_zero(&value) {
                        issues.push(field_path, "must be greater than zero");
                    } else {
                        out.insert(spec.name.to_string(), value);
                    }
                }
            }
        }
    }
    out
}

fn is_zero(value: &FieldValue) -> bool {
    match value {
        FieldValue::Dnum(d) => d.is_zero(),
        FieldValue::Uint(v) => v.is_zero(),
        _ => false,
    }
}

fn decode_value(ty: &FieldType, raw: &Value, path: &str, issues: &mut Issues) -> Option<FieldValue> {
    let decoded = match ty {
        FieldType::Dnum => decode_dnum(raw).map(FieldValue::Dnum),
        FieldType::Address => decode_address(raw).map(FieldValue::Address),
        FieldType::Uint => decode_uint(raw).map(FieldValue::Uint),
        FieldType::Bool => raw.as_bool()
                              .map(FieldValue::Bool)
                              .ok_or_else(|| "expected a boolean".to_string()),
        FieldType::Enum(variants) => match raw.as_str() {
            Some(s) if variants.contains(&s) => Ok(FieldValue::Enum(s.to_string())),
            _ => Err(format!("expected one of {}", variants.join(", "))),
        },
        FieldType::Array(inner) => {
            let Some(items) = raw.as_array() else {
                issues.push(path, "expected an array");
                return None;
            };
            let before = issues.list.len();
            let decoded: Vec<FieldValue> = items.iter()
                                                .enumerate()
                                                .filter_map(|(i, item)| {
                                                    decode_value(inner, item, &format!("{path}[{i}]"), issues)
                                                })
                                                .collect();
            return (issues.list.len() == before).then_some(FieldValue::Array(decoded));
        }
        FieldType::Record(specs) => {
            let Some(map) = raw.as_object() else {
                issues.push(path, "expected an object");
                return None;
            };
            let before = issues.list.len();
            let record = decode_record(specs, map, path, issues);
            return (issues.list.len() == before).then_some(FieldValue::Record(record));
        }
    };
    match decoded {
        Ok(v) => Some(v),
        Err(message) => {
            issues.push(path, message);
            None
        }
    }
}

fn integer_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        _ => None,
    }
}

fn decode_dnum(raw: &Value) -> Result<Dnum, String> {
    let pair = raw.as_array()
                  .filter(|a| a.len() == 2)
                  .ok_or_else(|| "expected [value, decimals]".to_string())?;
    let text = integer_text(&pair[0]).ok_or_else(|| "amount must be a non-negative integer".to_string())?;
    let decimals = pair[1].as_u64()
                          .and_then(|d| u8::try_from(d).ok())
                          .ok_or_else(|| "decimals must be a small non-negative integer".to_string())?;
    let dnum = Dnum::parse(&text, decimals).map_err(|e| e.to_string())?;
    dnum.normalized().map_err(|e| e.to_string())
}

fn decode_address(raw: &Value) -> Result<Address, String> {
    match raw.as_str() {
        Some(s) if s.starts_with("0x") && s.len() == 42 => {
            Address::from_str(s).map_err(|e| format!("invalid address: {e}"))
        }
        _ => Err("expected a 0x-prefixed 20-byte address".to_string()),
    }
}

fn decode_uint(raw: &Value) -> Result<U256, String> {
    match raw {
        Value::Number(n) => n.as_u64()
                             .map(U256::from)
                             .ok_or_else(|| "expected a non-negative integer".to_string()),
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16),
                Some(_) => return Err("empty hex integer".to_string()),
                None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => U256::from_str_radix(s, 10),
                None => return Err("expected a non-negative integer".to_string()),
            };
            parsed.map_err(|e| format!("invalid integer: {e}"))
        }
        _ => Err("expected a non-negative integer".to_string()),
    }
}

fn decode_link(raw: &Value, path: &str, issues: &mut Issues) -> Option<Link> {
    match raw.as_array().map(|a| a.as_slice()) {
        Some([Value::String(p), Value::String(label)]) => Some(Link { path: p.clone(),
                                                                      label: label.clone() }),
        _ => {
            issues.push(path, "expected [path, label]");
            None
        }
    }
}

fn decode_navigation(raw: &Value, issues: &mut Issues) -> Option<Navigation> {
    let Some(obj) = raw.as_object() else {
        issues.push("navigation", "expected an object");
        return None;
    };
    for key in obj.keys() {
        if !["backLink", "successLink", "successMessage"].contains(&key.as_str()) {
            issues.push(format!("navigation.{key}"), "unknown field");
        }
    }
    let back_link = match obj.get("backLink") {
        None | Some(Value::Null) => Some(None),
        Some(raw) => decode_link(raw, "navigation.backLink", issues).map(Some),
    };
    let success_link = match obj.get("successLink") {
        Some(raw) => decode_link(raw, "navigation.successLink", issues),
        None => {
            issues.push("navigation.successLink", "required");
            None
        }
    };
    let success_message = match obj.get("successMessage") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push("navigation.successMessage", "expected a string");
            None
        }
        None => {
            issues.push("navigation.successMessage", "required");
            None
        }
    };
    Some(Navigation { back_link: back_link?,
                      success_link: success_link?,
                      success_message: success_message? })
}
