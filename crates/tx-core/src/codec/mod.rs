//! Codec de requests: valida y normaliza el payload crudo de un flujo contra
//! la forma declarada por ese flujo.
//!
//! La validación es total: se recorren todos los campos y se devuelven todos
//! los problemas juntos en un único `ValidationError`.

mod shape;
mod validate;

pub use shape::{FieldSpec, FieldType, Refinement, RequestShape};
pub use validate::validate;
