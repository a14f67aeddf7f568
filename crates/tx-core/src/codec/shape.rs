/// Tipo declarado de un campo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `[entero, decimales]`, normalizado a 18 decimales.
    Dnum,
    Address,
    /// Decimal o `0x` hex.
    Uint,
    Bool,
    Enum(&'static [&'static str]),
    Array(Box<FieldType>),
    Record(Vec<FieldSpec>),
}

impl FieldType {
    pub fn array_of(inner: FieldType) -> Self {
        FieldType::Array(Box::new(inner))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// Monto o entero distinto de cero.
    Positive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub refinement: Option<Refinement>,
}

impl FieldSpec {
    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name,
               ty,
               required: true,
               refinement: None }
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name,
               ty,
               required: false,
               refinement: None }
    }

    pub fn positive(mut self) -> Self {
        self.refinement = Some(Refinement::Positive);
        self
    }
}

/// Forma del bloque `fields` de un flujo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestShape {
    pub flow: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl RequestShape {
    pub fn new(flow: &'static str) -> Self {
        Self { flow, fields: Vec::new() }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }
}
